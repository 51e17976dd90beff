//! Error types for the otcure_core library.

use crate::types::LimitExceeded;
use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for otcure_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error (also raised for unknown rule kinds)
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// A warning rule failed load-time validation
    #[error("Invalid rule '{rule}': {reason}")]
    RuleValidation { rule: String, reason: String },

    /// Profile form submitted with a missing or invalid field
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Commit refused because one or more daily maximums would be exceeded
    #[error("Daily maximum exceeded: {}", ExceededList(.0))]
    DoseLimitExceeded(Vec<LimitExceeded>),

    /// Selection contains a medication the profile may not take
    #[error("'{id}' cannot be selected ({reason})")]
    Ineligible { id: String, reason: String },
}

impl Error {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

struct ExceededList<'a>(&'a [LimitExceeded]);

impl fmt::Display for ExceededList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{} {:.1} mg > {:.1} mg",
                item.ingredient, item.total_mg, item.limit_mg
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_converts() {
        fn parse(text: &str) -> Result<u32> {
            Ok(serde_json::from_str(text)?)
        }

        let err = parse("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().starts_with("JSON error: "));
    }

    #[test]
    fn test_exceeded_list_display() {
        let err = Error::DoseLimitExceeded(vec![LimitExceeded {
            ingredient: "아세트아미노펜".into(),
            total_mg: 4100.0,
            limit_mg: 4000.0,
        }]);
        assert_eq!(
            err.to_string(),
            "Daily maximum exceeded: 아세트아미노펜 4100.0 mg > 4000.0 mg"
        );
    }
}
