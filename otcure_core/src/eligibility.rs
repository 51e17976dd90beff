//! Eligibility filter.
//!
//! Annotates catalog entries as selectable or not for a given profile and
//! set of excluded ingredients. Checks run in precedence order and the first
//! match wins:
//!
//! 1. Pregnant/breastfeeding and the medication is contraindicated
//! 2. Elderly and the medication carries an age caution
//! 3. The medication contains an excluded ingredient
//!
//! A pregnancy caution never disables a medication; it only labels it.

use crate::types::{
    AgeRisk, Catalog, Eligibility, EligibilityReason, Medication, PregnancyRisk, UserProfile,
};
use std::collections::{BTreeMap, BTreeSet};

/// Decide whether `med` is selectable for `profile`
pub fn selectable(
    med: &Medication,
    profile: &UserProfile,
    excluded_ingredients: &BTreeSet<String>,
) -> Eligibility {
    let pregnant = profile.pregnancy.is_active();

    if pregnant && med.pregnancy_risk == PregnancyRisk::Contraindicated {
        return blocked(EligibilityReason::PregnancyContraindicated);
    }

    if profile.is_elderly() && med.age_risk == AgeRisk::ElderlyCaution {
        return blocked(EligibilityReason::AgeCaution);
    }

    if med
        .ingredients
        .keys()
        .any(|ingredient| excluded_ingredients.contains(ingredient))
    {
        return blocked(EligibilityReason::ExcludedIngredient);
    }

    if pregnant && med.pregnancy_risk == PregnancyRisk::Caution {
        return Eligibility {
            allowed: true,
            reason: Some(EligibilityReason::PregnancyCaution),
        };
    }

    Eligibility {
        allowed: true,
        reason: None,
    }
}

fn blocked(reason: EligibilityReason) -> Eligibility {
    Eligibility {
        allowed: false,
        reason: Some(reason),
    }
}

/// Annotate every catalog entry, keyed by identifier
pub fn annotate_catalog(
    catalog: &Catalog,
    profile: &UserProfile,
    excluded_ingredients: &BTreeSet<String>,
) -> BTreeMap<String, Eligibility> {
    catalog
        .list()
        .into_iter()
        .map(|med| {
            (
                med.id.clone(),
                selectable(med, profile, excluded_ingredients),
            )
        })
        .collect()
}
