//! Session context and the operations exposed to presentation layers.
//!
//! A `Session` exclusively owns the profile, the excluded-ingredient set and
//! the dose log. Read-only reference data (`Catalog`, `RuleSet`,
//! `IngredientLimits`) is passed in by the caller.

use crate::aggregate::{summarize, DoseSummary};
use crate::dose_log::DoseLog;
use crate::eligibility::{annotate_catalog, selectable};
use crate::rules::{RuleSet, Warning};
use crate::types::{
    Accepted, Catalog, Eligibility, IngredientLimits, IngredientTotals, LogEntry, Medication,
    UserProfile,
};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

/// Per-user session state
#[derive(Clone, Debug)]
pub struct Session {
    profile: UserProfile,
    excluded: BTreeSet<String>,
    log: DoseLog,
}

impl Session {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            excluded: BTreeSet::new(),
            log: DoseLog::new(),
        }
    }

    pub fn with_excluded<I, S>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(ingredients.into_iter().map(Into::into));
        self
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    pub fn exclude_ingredient(&mut self, ingredient: impl Into<String>) -> bool {
        self.excluded.insert(ingredient.into())
    }

    pub fn include_ingredient(&mut self, ingredient: &str) -> bool {
        self.excluded.remove(ingredient)
    }

    pub fn log(&self) -> &DoseLog {
        &self.log
    }

    /// Selectability of every catalog entry for this session
    pub fn selectable_annotations(&self, catalog: &Catalog) -> BTreeMap<String, Eligibility> {
        annotate_catalog(catalog, &self.profile, &self.excluded)
    }

    /// Turn identifiers into a selection
    ///
    /// Duplicates collapse to one entry and unknown identifiers are skipped.
    /// A medication this profile may not take is an error.
    pub fn resolve_selection<'c, S: AsRef<str>>(
        &self,
        catalog: &'c Catalog,
        ids: &[S],
    ) -> Result<Vec<&'c Medication>> {
        let mut seen = HashSet::new();
        let mut selection = Vec::with_capacity(ids.len());

        for id in ids {
            let id = id.as_ref();
            if !seen.insert(id) {
                continue;
            }
            let Some(med) = catalog.get(id) else {
                tracing::debug!("Skipping unknown medication '{}'", id);
                continue;
            };

            let eligibility = selectable(med, &self.profile, &self.excluded);
            if !eligibility.allowed {
                return Err(Error::Ineligible {
                    id: med.id.clone(),
                    reason: eligibility
                        .reason
                        .map(|r| r.to_string())
                        .unwrap_or_default(),
                });
            }
            selection.push(med);
        }

        Ok(selection)
    }

    /// Single-dose totals and duplicate-ingredient attribution
    pub fn aggregate_single_dose<S: AsRef<str>>(
        &self,
        catalog: &Catalog,
        ids: &[S],
    ) -> Result<DoseSummary> {
        let selection = self.resolve_selection(catalog, ids)?;
        Ok(summarize(&selection))
    }

    /// Rule-engine warnings for a selection
    pub fn evaluate_warnings<S: AsRef<str>>(
        &self,
        catalog: &Catalog,
        rules: &RuleSet,
        ids: &[S],
    ) -> Result<Vec<Warning>> {
        let selection = self.resolve_selection(catalog, ids)?;
        Ok(rules.evaluate(&selection))
    }

    /// Log a dose if no daily maximum would be exceeded
    ///
    /// A rejected commit leaves the log unchanged.
    pub fn commit_dose<S: AsRef<str>>(
        &mut self,
        catalog: &Catalog,
        limits: &IngredientLimits,
        ids: &[S],
        at: NaiveDateTime,
        note: &str,
    ) -> Result<Accepted> {
        let selection = self.resolve_selection(catalog, ids)?;
        if selection.is_empty() {
            return Err(Error::validation("selection", "복용할 약물을 선택해주세요."));
        }

        let entry = LogEntry {
            id: Uuid::new_v4(),
            date: at.date(),
            time: at.time(),
            note: note.trim().to_string(),
            medication_ids: selection.iter().map(|med| med.id.clone()).collect(),
        };

        self.log.try_commit(catalog, limits, entry)
    }

    /// Today's entries in insertion order
    pub fn todays_log(&self, today: NaiveDate) -> Vec<&LogEntry> {
        self.log.entries_on(today)
    }

    /// Cumulative ingredient totals over today's entries
    pub fn todays_ingredient_totals(&self, catalog: &Catalog, today: NaiveDate) -> IngredientTotals {
        self.log.totals_on(catalog, today)
    }
}

/// Every catalog entry, ordered by identifier
pub fn list_catalog(catalog: &Catalog) -> Vec<&Medication> {
    catalog.list()
}
