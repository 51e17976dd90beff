//! Dosage aggregation.
//!
//! Sums ingredient quantities across a selection (single-dose view) or across
//! a day's log entries plus a pending selection (daily-cumulative view).
//! Totals are plain floating-point sums; rounding happens only at display.

use crate::types::{Catalog, IngredientSources, IngredientTotals, LogEntry, Medication};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Single-dose totals with per-ingredient source attribution
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct DoseSummary {
    pub totals: IngredientTotals,
    pub sources: IngredientSources,
}

impl DoseSummary {
    /// Ingredients contributed by two or more medications
    pub fn duplicates(&self) -> IngredientSources {
        self.sources
            .iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(ingredient, sources)| (ingredient.clone(), sources.clone()))
            .collect()
    }

    pub fn is_duplicate(&self, ingredient: &str) -> bool {
        self.sources
            .get(ingredient)
            .is_some_and(|sources| sources.len() > 1)
    }
}

/// Sum ingredient quantities across the given medications
///
/// The caller controls multiplicity: a medication passed twice is counted twice.
pub fn aggregate<'a, I>(medications: I) -> IngredientTotals
where
    I: IntoIterator<Item = &'a Medication>,
{
    let mut totals = IngredientTotals::new();
    for med in medications {
        for (ingredient, mg) in &med.ingredients {
            *totals.entry(ingredient.clone()).or_insert(0.0) += mg;
        }
    }
    totals
}

/// Aggregate a selection and record which medications contribute each ingredient
///
/// The selection is a set: a medication listed twice is counted once.
pub fn summarize(selection: &[&Medication]) -> DoseSummary {
    let mut summary = DoseSummary::default();
    let mut seen = HashSet::new();
    for med in selection {
        if !seen.insert(med.id.as_str()) {
            continue;
        }
        for (ingredient, mg) in &med.ingredients {
            *summary.totals.entry(ingredient.clone()).or_insert(0.0) += mg;
            summary
                .sources
                .entry(ingredient.clone())
                .or_default()
                .push(med.id.clone());
        }
    }
    summary
}

/// Entries of `log` dated `today`, in insertion order
pub fn entries_on<'a>(log: &'a [LogEntry], today: NaiveDate) -> impl Iterator<Item = &'a LogEntry> {
    log.iter().filter(move |entry| entry.date == today)
}

/// Cumulative totals over today's log entries plus a candidate selection
///
/// Log entries reference medications by identifier; identifiers missing from
/// the catalog are skipped.
pub fn daily_cumulative(
    catalog: &Catalog,
    log: &[LogEntry],
    today: NaiveDate,
    candidate: &[&Medication],
) -> IngredientTotals {
    let logged = entries_on(log, today)
        .flat_map(|entry| entry.medication_ids.iter())
        .filter_map(|id| {
            let med = catalog.get(id);
            if med.is_none() {
                tracing::debug!("Skipping unknown medication '{}' in log", id);
            }
            med
        });

    aggregate(logged.chain(candidate.iter().copied()))
}
