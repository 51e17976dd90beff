//! Core domain types for the OTCure dose tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Medications and their risk classification
//! - Ingredient limits and totals
//! - User profiles
//! - Dose log entries and commit results

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Age at which a profile is treated as elderly
pub const ELDERLY_AGE: u32 = 60;

/// Ingredient name → milligrams
pub type IngredientTotals = BTreeMap<String, f64>;

/// Ingredient name → names of the medications contributing it
pub type IngredientSources = BTreeMap<String, Vec<String>>;

// ============================================================================
// Medication Types
// ============================================================================

/// Pregnancy risk classification of a medication
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PregnancyRisk {
    #[default]
    None,
    Contraindicated,
    Caution,
}

/// Age risk classification of a medication
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgeRisk {
    #[default]
    None,
    ElderlyCaution,
}

/// An over-the-counter medication (e.g., "타이레놀 500mg")
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub description: String,
    pub usage: String,
    /// Ingredient name → mg per dose
    pub ingredients: BTreeMap<String, f64>,
    pub class_type: String,
    pub effect_group: Option<String>,
    pub pregnancy_risk: PregnancyRisk,
    pub age_risk: AgeRisk,
    pub reference_url: Option<String>,
}

impl Medication {
    pub fn contains_ingredient(&self, ingredient: &str) -> bool {
        self.ingredients.contains_key(ingredient)
    }
}

/// Daily maximum doses, ingredient name → mg
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct IngredientLimits(pub BTreeMap<String, f64>);

impl IngredientLimits {
    pub fn get(&self, ingredient: &str) -> Option<f64> {
        self.0.get(ingredient).copied()
    }

    /// Overlay `other` on top of these limits; entries in `other` win
    pub fn merged_with(&self, other: &IngredientLimits) -> IngredientLimits {
        let mut merged = self.0.clone();
        for (ingredient, limit) in &other.0 {
            merged.insert(ingredient.clone(), *limit);
        }
        IngredientLimits(merged)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

// ============================================================================
// Profile Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Other,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PregnancyStatus {
    #[default]
    None,
    Pregnant,
    Breastfeeding,
}

impl PregnancyStatus {
    /// True for any status under which contraindicated medications are blocked
    pub fn is_active(self) -> bool {
        matches!(self, PregnancyStatus::Pregnant | PregnancyStatus::Breastfeeding)
    }
}

/// Validated user profile, immutable for the lifetime of a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub pregnancy: PregnancyStatus,
}

impl UserProfile {
    pub fn is_elderly(&self) -> bool {
        self.age >= ELDERLY_AGE
    }
}

// ============================================================================
// Eligibility Types
// ============================================================================

/// Why a medication is disabled or labelled for a profile
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilityReason {
    PregnancyContraindicated,
    PregnancyCaution,
    AgeCaution,
    ExcludedIngredient,
}

impl EligibilityReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EligibilityReason::PregnancyContraindicated => "pregnancy-contraindicated",
            EligibilityReason::PregnancyCaution => "pregnancy-caution",
            EligibilityReason::AgeCaution => "age-caution",
            EligibilityReason::ExcludedIngredient => "excluded-ingredient",
        }
    }
}

impl fmt::Display for EligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectability of one catalog entry for a given profile
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Eligibility {
    pub allowed: bool,
    pub reason: Option<EligibilityReason>,
}

// ============================================================================
// Log Types
// ============================================================================

/// A committed dose event
///
/// Medications are referenced by identifier, never copied.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub note: String,
    pub medication_ids: Vec<String>,
}

/// One ingredient over its daily maximum
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LimitExceeded {
    pub ingredient: String,
    pub total_mg: f64,
    pub limit_mg: f64,
}

/// Result of a successful commit
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Accepted {
    pub entry: LogEntry,
    /// Cumulative totals for the day including the new entry
    pub daily_totals: IngredientTotals,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The complete catalog of medications and daily limits
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub medications: BTreeMap<String, Medication>,
    pub limits: IngredientLimits,
}
