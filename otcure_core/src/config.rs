//! Configuration file support for OTCure.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/otcure/config.toml`.

use crate::rules::{default_rules, RuleSet, WarningRule};
use crate::types::IngredientLimits;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,

    /// Daily maximums layered over the catalog's built-in limits
    #[serde(default)]
    pub limits: IngredientLimits,

    /// Replaces the built-in rule set when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<WarningRule>>,
}

/// Session defaults
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub excluded_ingredients: Vec<String>,
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (ingredient, limit) in self.limits.iter() {
            if !limit.is_finite() || *limit <= 0.0 {
                return Err(Error::Config(format!(
                    "limit for '{}' must be positive, got {}",
                    ingredient, limit
                )));
            }
        }
        if let Some(rules) = &self.rules {
            RuleSet::new(rules.clone())?;
        }
        Ok(())
    }

    /// The configured rule set, or the built-in one
    pub fn rule_set(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(rules) => RuleSet::new(rules.clone()),
            None => RuleSet::new(default_rules()),
        }
    }

    /// Catalog limits with configured overrides applied
    pub fn effective_limits(&self, catalog_limits: &IngredientLimits) -> IngredientLimits {
        catalog_limits.merged_with(&self.limits)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("otcure").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::rules::{RuleCheck, Severity};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.session.excluded_ingredients.is_empty());
        assert!(config.rules.is_none());
        assert_eq!(config.rule_set().unwrap().len(), 5);
    }

    #[test]
    fn test_partial_config_overrides_limit() {
        let config = Config::parse(
            r#"
[limits]
"아세트아미노펜" = 3000.0
"#,
        )
        .unwrap();

        let catalog = build_default_catalog();
        let limits = config.effective_limits(&catalog.limits);
        assert_eq!(limits.get("아세트아미노펜"), Some(3000.0));
        assert_eq!(limits.get("이부프로펜"), Some(3200.0));
    }

    #[test]
    fn test_rules_replace_defaults() {
        let config = Config::parse(
            r#"
[[rules]]
id = "cold-class"
severity = "warning"
message = "감기약이 포함되어 있습니다."

[rules.check]
kind = "class-type-overlap"
classes = ["감기약"]
"#,
        )
        .unwrap();

        let rules = config.rule_set().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.rules()[0].severity, Severity::Warning);
        assert_eq!(
            rules.rules()[0].check,
            RuleCheck::ClassTypeOverlap {
                classes: vec!["감기약".into()],
                min_matches: 1,
            }
        );
    }

    #[test]
    fn test_unknown_rule_kind_rejected_at_load() {
        let result = Config::parse(
            r#"
[[rules]]
id = "mystery"
severity = "error"
message = "?"

[rules.check]
kind = "interaction-matrix"
"#,
        );
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_invalid_rule_rejected_at_load() {
        let result = Config::parse(
            r#"
[[rules]]
id = "empty-names"
severity = "error"
message = "never"

[rules.check]
kind = "named-drug-set"
names = []
"#,
        );
        assert!(matches!(result, Err(Error::RuleValidation { .. })));
    }

    #[test]
    fn test_non_positive_limit_rejected() {
        let result = Config::parse(
            r#"
[limits]
"이부프로펜" = 0.0
"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.session.excluded_ingredients = vec!["카페인무수물".into()];
        config.rules = Some(default_rules());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.session.excluded_ingredients, vec!["카페인무수물"]);
        assert_eq!(loaded.rule_set().unwrap(), config.rule_set().unwrap());
    }
}
