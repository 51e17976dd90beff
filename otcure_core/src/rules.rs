//! Warning rule engine.
//!
//! Rules are evaluated independently, in declared order, against a selection
//! of medications. Each rule fires at most once per evaluation. Severity is
//! advisory: warnings never block a selection or a commit.

use crate::types::Medication;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Severity of a fired rule
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

fn default_min_count() -> usize {
    2
}

fn default_min_matches() -> usize {
    1
}

/// The condition a rule checks, tagged by `kind`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RuleCheck {
    /// At least `min_count` distinct medications contain one of the ingredients
    IngredientOverlap {
        ingredients: Vec<String>,
        #[serde(default = "default_min_count")]
        min_count: usize,
    },
    /// Every named medication is selected
    NamedDrugSet { names: Vec<String> },
    /// The selected effect groups hit at least two of `groups`
    EffectGroupSet { groups: Vec<String> },
    /// The selected effect groups hit at least `min_matches` of `groups`
    EffectGroupOverlap {
        groups: Vec<String>,
        #[serde(default = "default_min_matches")]
        min_matches: usize,
    },
    /// The selected class labels hit at least `min_matches` of `classes`
    ClassTypeOverlap {
        classes: Vec<String>,
        #[serde(default = "default_min_matches")]
        min_matches: usize,
    },
    /// Some class label is shared by at least `min_count` selected medications.
    /// The message may use `{class}` and `{count}` placeholders.
    ClassTypeCount {
        #[serde(default = "default_min_count")]
        min_count: usize,
    },
}

impl RuleCheck {
    pub fn kind_name(&self) -> &'static str {
        match self {
            RuleCheck::IngredientOverlap { .. } => "ingredient-overlap",
            RuleCheck::NamedDrugSet { .. } => "named-drug-set",
            RuleCheck::EffectGroupSet { .. } => "effect-group-set",
            RuleCheck::EffectGroupOverlap { .. } => "effect-group-overlap",
            RuleCheck::ClassTypeOverlap { .. } => "class-type-overlap",
            RuleCheck::ClassTypeCount { .. } => "class-type-count",
        }
    }
}

/// A configured warning rule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WarningRule {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    pub check: RuleCheck,
}

impl WarningRule {
    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::RuleValidation {
            rule: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.message.trim().is_empty() {
            return Err(invalid("message must not be empty"));
        }

        match &self.check {
            RuleCheck::IngredientOverlap {
                ingredients,
                min_count,
            } => {
                if ingredients.is_empty() {
                    return Err(invalid("ingredients must not be empty"));
                }
                if *min_count == 0 {
                    return Err(invalid("min_count must be at least 1"));
                }
            }
            RuleCheck::NamedDrugSet { names } => {
                if names.is_empty() {
                    return Err(invalid("names must not be empty"));
                }
            }
            RuleCheck::EffectGroupSet { groups } => {
                if groups.len() < 2 {
                    return Err(invalid("groups must list at least two effect groups"));
                }
            }
            RuleCheck::EffectGroupOverlap {
                groups,
                min_matches,
            } => {
                if groups.is_empty() {
                    return Err(invalid("groups must not be empty"));
                }
                if *min_matches == 0 {
                    return Err(invalid("min_matches must be at least 1"));
                }
            }
            RuleCheck::ClassTypeOverlap {
                classes,
                min_matches,
            } => {
                if classes.is_empty() {
                    return Err(invalid("classes must not be empty"));
                }
                if *min_matches == 0 {
                    return Err(invalid("min_matches must be at least 1"));
                }
            }
            RuleCheck::ClassTypeCount { min_count } => {
                if *min_count == 0 {
                    return Err(invalid("min_count must be at least 1"));
                }
            }
        }

        Ok(())
    }
}

/// A fired rule
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Warning {
    pub rule_id: String,
    pub kind: &'static str,
    pub message: String,
    pub severity: Severity,
}

/// An ordered, validated set of warning rules
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<WarningRule>,
}

impl RuleSet {
    /// Validate and wrap a list of rules
    pub fn new(rules: Vec<WarningRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.id.as_str()) {
                return Err(Error::RuleValidation {
                    rule: rule.id.clone(),
                    reason: "duplicate rule id".into(),
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[WarningRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against the selection, in declared order
    pub fn evaluate(&self, selection: &[&Medication]) -> Vec<Warning> {
        evaluate(selection, &self.rules)
    }
}

/// Evaluate rules against a selection
///
/// The selection is a set: a medication listed twice is counted once.
pub fn evaluate(selection: &[&Medication], rules: &[WarningRule]) -> Vec<Warning> {
    let selection = SelectionFacts::new(selection);

    rules
        .iter()
        .filter_map(|rule| {
            let message = fire(rule, &selection)?;
            tracing::debug!("Rule '{}' fired", rule.id);
            Some(Warning {
                rule_id: rule.id.clone(),
                kind: rule.check.kind_name(),
                message,
                severity: rule.severity,
            })
        })
        .collect()
}

/// Derived views of a selection shared by all rule kinds
struct SelectionFacts<'a> {
    meds: Vec<&'a Medication>,
    names: HashSet<&'a str>,
    effect_groups: HashSet<&'a str>,
    classes: BTreeMap<&'a str, usize>,
}

impl<'a> SelectionFacts<'a> {
    fn new(selection: &[&'a Medication]) -> Self {
        let mut meds: Vec<&Medication> = Vec::with_capacity(selection.len());
        let mut names = HashSet::new();
        for med in selection {
            if names.insert(med.id.as_str()) {
                meds.push(*med);
            }
        }

        let effect_groups = meds
            .iter()
            .filter_map(|med| med.effect_group.as_deref())
            .collect();

        let mut classes = BTreeMap::new();
        for med in &meds {
            *classes.entry(med.class_type.as_str()).or_insert(0) += 1;
        }

        Self {
            meds,
            names,
            effect_groups,
            classes,
        }
    }

    fn contributors(&self, ingredient: &str) -> usize {
        self.meds
            .iter()
            .filter(|med| med.contains_ingredient(ingredient))
            .count()
    }

    fn group_matches(&self, groups: &[String]) -> usize {
        let targets: BTreeSet<&str> = groups.iter().map(String::as_str).collect();
        targets
            .iter()
            .filter(|group| self.effect_groups.contains(*group))
            .count()
    }

    fn class_matches(&self, classes: &[String]) -> usize {
        let targets: BTreeSet<&str> = classes.iter().map(String::as_str).collect();
        targets
            .iter()
            .filter(|class| self.classes.contains_key(*class))
            .count()
    }
}

/// Returns the rendered message if the rule fires
fn fire(rule: &WarningRule, selection: &SelectionFacts<'_>) -> Option<String> {
    let fired = match &rule.check {
        RuleCheck::IngredientOverlap {
            ingredients,
            min_count,
        } => ingredients
            .iter()
            .any(|ingredient| selection.contributors(ingredient) >= *min_count),
        RuleCheck::NamedDrugSet { names } => names
            .iter()
            .all(|name| selection.names.contains(name.as_str())),
        RuleCheck::EffectGroupSet { groups } => selection.group_matches(groups) >= 2,
        RuleCheck::EffectGroupOverlap {
            groups,
            min_matches,
        } => selection.group_matches(groups) >= *min_matches,
        RuleCheck::ClassTypeOverlap {
            classes,
            min_matches,
        } => selection.class_matches(classes) >= *min_matches,
        RuleCheck::ClassTypeCount { min_count } => {
            let (class, count) = selection
                .classes
                .iter()
                .find(|(_, count)| **count >= *min_count)?;
            return Some(
                rule.message
                    .replace("{class}", class)
                    .replace("{count}", &count.to_string()),
            );
        }
    };

    fired.then(|| rule.message.clone())
}

/// The built-in rule set
pub fn default_rules() -> Vec<WarningRule> {
    vec![
        WarningRule {
            id: "acetaminophen-overlap".into(),
            severity: Severity::Error,
            message: "아세트아미노펜 성분을 중복하여 섭취합니다. 간 손상 위험!".into(),
            check: RuleCheck::IngredientOverlap {
                ingredients: vec!["아세트아미노펜".into()],
                min_count: 2,
            },
        },
        WarningRule {
            id: "tylenol-cold-combination".into(),
            severity: Severity::Error,
            message: "유사한 약을 중복으로 섭취하게 됩니다. 두 약 모두 해열/진통 효과가 있어 권장되지 않습니다."
                .into(),
            check: RuleCheck::NamedDrugSet {
                names: vec!["타이레놀 500mg".into(), "타이레놀 콜드-에스 정".into()],
            },
        },
        // No catalog entry belongs to the Aspirin group yet, so this only fires
        // once one is added.
        WarningRule {
            id: "nsaid-aspirin-conflict".into(),
            severity: Severity::Warning,
            message: "NSAIDs(이부프로펜 계열)와 아스피린을 함께 복용하면 위장 출혈 위험이 높아집니다."
                .into(),
            check: RuleCheck::EffectGroupSet {
                groups: vec!["Ibuprofen".into(), "Aspirin".into()],
            },
        },
        // Two matches, so a single antihistamine product stays quiet
        WarningRule {
            id: "multiple-antihistamine".into(),
            severity: Severity::Error,
            message: "졸음을 유발하는 항히스타민 성분을 중복 섭취할 위험이 있습니다. 운전 등 위험한 작업을 피하세요."
                .into(),
            check: RuleCheck::EffectGroupOverlap {
                groups: vec!["Antihistamine".into(), "Cold_Multi".into()],
                min_matches: 2,
            },
        },
        WarningRule {
            id: "same-class-count".into(),
            severity: Severity::Warning,
            message: "'{class}' 계열 약물을 {count}개 함께 선택했습니다. 같은 계열 약물의 중복 복용에 주의하세요."
                .into(),
            check: RuleCheck::ClassTypeCount { min_count: 2 },
        },
    ]
}

/// The built-in rule set, validated
pub fn default_rule_set() -> Result<RuleSet> {
    RuleSet::new(default_rules())
}
