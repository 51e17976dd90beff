#![forbid(unsafe_code)]

//! Core domain model and business logic for the OTCure dose tracker.
//!
//! This crate provides:
//! - Domain types (medications, profiles, log entries)
//! - Catalog and daily ingredient limits
//! - Dosage aggregation
//! - Warning rule engine
//! - Eligibility filter
//! - Session-scoped dose log with a daily-maximum gate

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod profile;
pub mod aggregate;
pub mod rules;
pub mod eligibility;
pub mod dose_log;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, format_mg, get_default_catalog};
pub use config::Config;
pub use profile::ProfileForm;
pub use aggregate::{aggregate, daily_cumulative, summarize, DoseSummary};
pub use rules::{default_rule_set, evaluate, RuleCheck, RuleSet, Severity, Warning, WarningRule};
pub use eligibility::{annotate_catalog, selectable};
pub use dose_log::DoseLog;
pub use session::{list_catalog, Session};
