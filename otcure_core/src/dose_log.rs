//! Append-only dose log with a daily-maximum commit gate.
//!
//! The log lives only for the session. A commit is all-or-nothing: if any
//! limited ingredient would exceed its daily maximum the log is left
//! untouched and every exceeding ingredient is reported.

use crate::aggregate::{daily_cumulative, entries_on};
use crate::types::{
    Accepted, Catalog, IngredientLimits, IngredientTotals, LimitExceeded, LogEntry, Medication,
};
use crate::{Error, Result};
use chrono::NaiveDate;

/// Committed dose events for a session, in insertion order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DoseLog {
    entries: Vec<LogEntry>,
}

impl DoseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, including those from earlier dates
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries dated `today`, in insertion order
    pub fn entries_on(&self, today: NaiveDate) -> Vec<&LogEntry> {
        entries_on(&self.entries, today).collect()
    }

    /// Cumulative totals for `today` without a candidate
    pub fn totals_on(&self, catalog: &Catalog, today: NaiveDate) -> IngredientTotals {
        daily_cumulative(catalog, &self.entries, today, &[])
    }

    /// Append `candidate` if no daily maximum would be exceeded
    ///
    /// The candidate's medication ids are resolved through `catalog`; unknown
    /// ids are skipped.
    pub fn try_commit(
        &mut self,
        catalog: &Catalog,
        limits: &IngredientLimits,
        candidate: LogEntry,
    ) -> Result<Accepted> {
        let medications: Vec<&Medication> = candidate
            .medication_ids
            .iter()
            .filter_map(|id| catalog.get(id))
            .collect();
        let totals = daily_cumulative(catalog, &self.entries, candidate.date, &medications);
        let exceeded = exceeded_limits(&totals, limits);

        if !exceeded.is_empty() {
            tracing::warn!(
                "Rejected dose commit: {} ingredient(s) over daily maximum",
                exceeded.len()
            );
            return Err(Error::DoseLimitExceeded(exceeded));
        }

        tracing::info!(
            "Committed dose of {} medication(s) at {} {}",
            candidate.medication_ids.len(),
            candidate.date,
            candidate.time
        );
        self.entries.push(candidate.clone());

        Ok(Accepted {
            entry: candidate,
            daily_totals: totals,
        })
    }
}

/// Every limited ingredient whose total strictly exceeds its limit
pub fn exceeded_limits(totals: &IngredientTotals, limits: &IngredientLimits) -> Vec<LimitExceeded> {
    totals
        .iter()
        .filter_map(|(ingredient, total)| {
            let limit = limits.get(ingredient)?;
            (*total > limit).then(|| LimitExceeded {
                ingredient: ingredient.clone(),
                total_mg: *total,
                limit_mg: limit,
            })
        })
        .collect()
}
