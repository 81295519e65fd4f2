//! Runtime configuration threaded explicitly through evaluators and
//! collections. Every field has a default, so an empty document is valid.

use crate::selection::SelectMode;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

///
/// SyntaxVersion
///
/// V1 treats the `o` and `x` modifiers as synonyms; V2 distinguishes them.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxVersion {
    V1,
    #[default]
    V2,
}

///
/// EvalConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    pub syntax: SyntaxVersion,

    /// Maximum number of (node, value) pairs kept for diagnostics.
    pub history_limit: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            syntax: SyntaxVersion::V2,
            history_limit: 32,
        }
    }
}

///
/// CollectionConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionConfig {
    pub page_size: usize,

    /// Minimum fetch granularity against a query service.
    pub block_size: usize,

    pub max_cached_blocks: usize,
    pub select_mode: SelectMode,
}

impl CollectionConfig {
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be greater than zero",
            });
        }
        if self.block_size == 0 {
            return Err(ConfigError::Invalid {
                field: "block_size",
                reason: "must be greater than zero",
            });
        }

        Ok(())
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            block_size: 20,
            max_cached_blocks: 64,
            select_mode: SelectMode::Multi,
        }
    }
}

///
/// Config
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub eval: EvalConfig,
    pub collection: CollectionConfig,
}

impl Config {
    /// Decode and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        self.collection.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").expect("empty config should decode");

        assert_eq!(config, Config::default());
        assert_eq!(config.eval.syntax, SyntaxVersion::V2);
        assert_eq!(config.collection.block_size, 20);
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = Config::from_toml_str(
            r#"
            [eval]
            syntax = "v1"

            [collection]
            page_size = 25
            select_mode = "single"
            "#,
        )
        .expect("config should decode");

        assert_eq!(config.eval.syntax, SyntaxVersion::V1);
        assert_eq!(config.eval.history_limit, 32);
        assert_eq!(config.collection.page_size, 25);
        assert_eq!(config.collection.select_mode, SelectMode::Single);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = Config::from_toml_str("[collection]\npage_size = 0\n")
            .expect_err("zero page size should be rejected");

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "page_size",
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[eval]\nsyntx = \"v1\"\n")
            .expect_err("misspelled key should be rejected");

        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
