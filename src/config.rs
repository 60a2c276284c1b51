//! Engine configuration.
//!
//! The only engine-wide setting is the course [`SortOrder`]. It can be set in
//! code through the builder or read from TOML:
//!
//! ```
//! use u_blockung::config::{EngineConfig, SortOrder};
//!
//! let config = EngineConfig::from_toml_str(r#"sort_order = "subject_kind_number""#).unwrap();
//! assert_eq!(config.sort_order, SortOrder::SubjectKindNumber);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Course ordering used for subject-kind lists, track course lists and
/// per-student course lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Course kind, then subject, then course number.
    #[default]
    KindSubjectNumber,
    /// Subject, then course kind, then course number.
    SubjectKindNumber,
}

impl SortOrder {
    /// Parses the legacy numeric code (1 = kind first, 2 = subject first).
    pub fn from_code(code: i32) -> Result<Self, ConfigError> {
        match code {
            1 => Ok(Self::KindSubjectNumber),
            2 => Ok(Self::SubjectKindNumber),
            other => Err(ConfigError::Invalid(format!("unknown sort order code {other}"))),
        }
    }
}

/// Settings for a [`crate::engine::ResultEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Course ordering.
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Sets the course ordering.
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sort_order() {
        assert_eq!(EngineConfig::new().sort_order, SortOrder::KindSubjectNumber);
    }

    #[test]
    fn test_from_toml() {
        let config = EngineConfig::from_toml_str("sort_order = \"subject_kind_number\"").unwrap();
        assert_eq!(config.sort_order, SortOrder::SubjectKindNumber);

        let empty = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(empty, EngineConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_unknown_order() {
        let err = EngineConfig::from_toml_str("sort_order = \"by_teacher\"");
        assert!(matches!(err, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_sort_order_codes() {
        assert_eq!(SortOrder::from_code(1).unwrap(), SortOrder::KindSubjectNumber);
        assert_eq!(SortOrder::from_code(2).unwrap(), SortOrder::SubjectKindNumber);
        assert!(SortOrder::from_code(3).is_err());
    }
}
