//! Default catalog of medications and daily ingredient limits.
//!
//! The catalog is immutable reference data, built once and shared for the
//! lifetime of the process.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn ingredients(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, mg)| (name.to_string(), *mg))
        .collect()
}

/// Builds the default catalog with the built-in medications and limits
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalogs.
pub fn build_default_catalog() -> Catalog {
    let medications = vec![
        Medication {
            id: "타이레놀 500mg".into(),
            description: "해열 및 진통 효과가 있는 약물입니다.".into(),
            usage: "성인 기준 1회 1-2정 (4-6시간 간격), 1일 최대 8정".into(),
            ingredients: ingredients(&[("아세트아미노펜", 500.0)]),
            class_type: "해열진통제".into(),
            effect_group: Some("Acetaminophen".into()),
            pregnancy_risk: PregnancyRisk::None,
            age_risk: AgeRisk::None,
            reference_url: Some(
                "https://www.health.kr/searchDrug/result_drug.asp?drug_cd=2021082400002".into(),
            ),
        },
        Medication {
            id: "부루펜 정 200mg".into(),
            description: "해열, 진통 및 소염 작용을 하는 비스테로이드성 소염진통제입니다.".into(),
            usage: "성인 기준 1회 1-2정 (200-400mg), 1일 3-4회".into(),
            ingredients: ingredients(&[("이부프로펜", 200.0)]),
            class_type: "해열진통제".into(),
            effect_group: Some("Ibuprofen".into()),
            pregnancy_risk: PregnancyRisk::Caution,
            age_risk: AgeRisk::None,
            reference_url: Some(
                "https://www.health.kr/searchDrug/result_drug.asp?drug_cd=A11A0500A0097".into(),
            ),
        },
        Medication {
            id: "게보린 정".into(),
            description: "두통, 치통, 생리통 등에 사용하는 복합 진통제입니다.".into(),
            usage: "성인 기준 1회 1정, 1일 3회까지 (4시간 이상 간격)".into(),
            ingredients: ingredients(&[
                ("아세트아미노펜", 300.0),
                ("이소프로필안티피린", 150.0),
                ("카페인무수물", 50.0),
            ]),
            class_type: "해열진통제".into(),
            effect_group: Some("Analgesic_Combo".into()),
            pregnancy_risk: PregnancyRisk::Contraindicated,
            age_risk: AgeRisk::None,
            reference_url: Some("https://www.health.kr/".into()),
        },
        Medication {
            id: "지르텍 정".into(),
            description: "알레르기성 비염, 피부염 등 알레르기 증상 완화에 사용됩니다.".into(),
            usage: "성인 기준 1일 1회 1정(10mg) 취침 전 복용".into(),
            ingredients: ingredients(&[("세티리진염산염", 10.0)]),
            class_type: "알레르기약".into(),
            effect_group: Some("Antihistamine".into()),
            pregnancy_risk: PregnancyRisk::None,
            age_risk: AgeRisk::None,
            reference_url: Some(
                "https://www.health.kr/searchDrug/result_drug.asp?drug_cd=A11ABBBBB2527".into(),
            ),
        },
        Medication {
            id: "훼스탈 플러스 정".into(),
            description: "소화 불량 증상(과식, 체함)을 완화하는 소화제입니다.".into(),
            usage: "성인 기준 1회 1-2정, 1일 3회 식후 복용".into(),
            ingredients: ingredients(&[
                ("판크레아틴", 150.0),
                ("셀룰라제", 50.0),
                ("우르소데옥시콜산", 10.0),
            ]),
            class_type: "소화제".into(),
            effect_group: Some("DigestiveEnzyme".into()),
            pregnancy_risk: PregnancyRisk::None,
            age_risk: AgeRisk::None,
            reference_url: Some(
                "https://www.health.kr/searchDrug/result_drug.asp?drug_cd=A11A0740B0009".into(),
            ),
        },
        Medication {
            id: "타이레놀 콜드-에스 정".into(),
            description: "종합 감기약 (콧물, 코막힘, 재채기, 두통, 발열 등)".into(),
            usage: "성인 기준 1회 1정, 1일 3회 식후 30분".into(),
            ingredients: ingredients(&[
                ("아세트아미노펜", 300.0),
                ("슈도에페드린염산염", 30.0),
                ("클로르페니라민말레산염", 2.0),
            ]),
            class_type: "감기약".into(),
            effect_group: Some("Cold_Multi".into()),
            pregnancy_risk: PregnancyRisk::Caution,
            age_risk: AgeRisk::ElderlyCaution,
            reference_url: Some(
                "https://www.health.kr/searchDrug/result_drug.asp?drug_cd=2021101800010".into(),
            ),
        },
    ];

    let limits = IngredientLimits(
        [
            ("아세트아미노펜", 4000.0),
            ("이부프로펜", 3200.0),
            ("슈도에페드린염산염", 240.0),
            ("클로르페니라민말레산염", 24.0),
            ("세티리진염산염", 10.0),
            ("카페인무수물", 400.0),
            ("이소프로필안티피린", 600.0),
        ]
        .iter()
        .map(|(name, mg)| (name.to_string(), *mg))
        .collect(),
    );

    Catalog::new(medications, limits)
}

impl Catalog {
    pub fn new(medications: Vec<Medication>, limits: IngredientLimits) -> Self {
        let medications = medications
            .into_iter()
            .map(|med| (med.id.clone(), med))
            .collect();
        Self {
            medications,
            limits,
        }
    }

    /// Look up a medication by identifier
    pub fn get(&self, id: &str) -> Option<&Medication> {
        self.medications.get(id)
    }

    /// All medications, ordered by identifier
    pub fn list(&self) -> Vec<&Medication> {
        self.medications.values().collect()
    }

    /// Group medications by classification label, labels sorted
    ///
    /// Unknown identifiers are skipped. Within a group, medications keep the
    /// order in which they were given.
    pub fn group_by_class<'a, S: AsRef<str>>(
        &'a self,
        ids: &[S],
    ) -> BTreeMap<&'a str, Vec<&'a Medication>> {
        let mut groups: BTreeMap<&str, Vec<&Medication>> = BTreeMap::new();
        for med in ids.iter().filter_map(|id| self.get(id.as_ref())) {
            groups.entry(med.class_type.as_str()).or_default().push(med);
        }
        groups
    }

    /// Validate the catalog structure
    ///
    /// Returns a list of validation errors, or empty vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, med) in &self.medications {
            if key != &med.id {
                errors.push(format!(
                    "Medication key '{}' does not match id '{}'",
                    key, med.id
                ));
            }

            if med.ingredients.is_empty() {
                errors.push(format!("Medication '{}' has no ingredients", med.id));
            }

            for (ingredient, mg) in &med.ingredients {
                if !mg.is_finite() || *mg < 0.0 {
                    errors.push(format!(
                        "Medication '{}': invalid quantity {} for '{}'",
                        med.id, mg, ingredient
                    ));
                }
            }

            if med.class_type.trim().is_empty() {
                errors.push(format!("Medication '{}' has no class type", med.id));
            }
        }

        for (ingredient, limit) in self.limits.iter() {
            if !limit.is_finite() || *limit <= 0.0 {
                errors.push(format!(
                    "Limit for '{}' must be positive, got {}",
                    ingredient, limit
                ));
            }
        }

        errors
    }
}

/// Render a milligram amount with one decimal place
pub fn format_mg(mg: f64) -> String {
    format!("{:.1} mg", mg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.medications.len(), 6);
        assert_eq!(catalog.limits.get("아세트아미노펜"), Some(4000.0));
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let catalog = get_default_catalog();
        let ids: Vec<_> = catalog.list().iter().map(|m| m.id.clone()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_every_eligibility_path_has_data() {
        let catalog = get_default_catalog();
        let meds = catalog.list();
        assert!(meds
            .iter()
            .any(|m| m.pregnancy_risk == PregnancyRisk::Contraindicated));
        assert!(meds.iter().any(|m| m.pregnancy_risk == PregnancyRisk::Caution));
        assert!(meds.iter().any(|m| m.age_risk == AgeRisk::ElderlyCaution));
    }

    #[test]
    fn test_validate_flags_bad_medication() {
        let med = Medication {
            id: "Empty".into(),
            description: String::new(),
            usage: String::new(),
            ingredients: BTreeMap::new(),
            class_type: "기타".into(),
            effect_group: None,
            pregnancy_risk: PregnancyRisk::None,
            age_risk: AgeRisk::None,
            reference_url: None,
        };
        let mut negative = med.clone();
        negative.id = "Negative".into();
        negative.ingredients.insert("x".into(), -1.0);

        let limits = IngredientLimits([("x".to_string(), 0.0)].into_iter().collect());
        let catalog = Catalog::new(vec![med, negative], limits);

        let errors = catalog.validate();
        assert_eq!(errors.len(), 3, "{:?}", errors);
    }

    #[test]
    fn test_group_by_class_sorted_and_skips_unknown() {
        let catalog = get_default_catalog();
        let groups = catalog.group_by_class(&["지르텍 정", "타이레놀 500mg", "없는 약", "부루펜 정 200mg"]);

        let labels: Vec<_> = groups.keys().copied().collect();
        assert_eq!(labels, vec!["알레르기약", "해열진통제"]);
        assert_eq!(groups["해열진통제"].len(), 2);
        assert_eq!(groups["해열진통제"][0].id, "타이레놀 500mg");
    }

    #[test]
    fn test_format_mg_one_decimal() {
        assert_eq!(format_mg(800.0), "800.0 mg");
        assert_eq!(format_mg(2.26), "2.3 mg");
    }
}
