//! Search configuration.
//!
//! One `SearchConfig` drives a whole search. It is loaded from TOML,
//! validated once, and handed to each request as an immutable snapshot.
//!
//! ```toml
//! mixing_coefficient = 0.7
//! provider_timeout_ms = 3000
//!
//! [providers]
//! mutual_weight = 1.0
//!
//! [security]
//! max_results = 20
//!
//! [term]
//! min_length = 2
//! max_length = 50
//! ```

use pipeline::{RankingThresholds, RankingWeights, SecurityFilterConfig, TermBounds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Base relationship weights the graph providers attach to their rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderWeights {
    /// Related branch, follow edges in both directions
    pub mutual_weight: f64,
    /// Related branch, a follow edge in one direction only
    pub one_way_weight: f64,
    /// Unknown branch, per followed account that also follows the candidate
    pub shared_connection_weight: f64,
}

impl Default for ProviderWeights {
    fn default() -> Self {
        Self {
            mutual_weight: 1.0,
            one_way_weight: 0.5,
            shared_connection_weight: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(default = "RankingWeights::related_defaults")]
    pub related_weights: RankingWeights,
    #[serde(default = "RankingWeights::unknown_defaults")]
    pub unknown_weights: RankingWeights,
    pub thresholds: RankingThresholds,
    pub providers: ProviderWeights,
    pub security: SecurityFilterConfig,
    /// Share of results reserved for related candidates, in [0, 1]
    pub mixing_coefficient: f64,
    /// Applied to each provider independently
    pub provider_timeout_ms: u64,
    /// Rows requested from each provider
    pub provider_limit: usize,
    pub term: TermBounds,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            related_weights: RankingWeights::related_defaults(),
            unknown_weights: RankingWeights::unknown_defaults(),
            thresholds: RankingThresholds::default(),
            providers: ProviderWeights::default(),
            security: SecurityFilterConfig::default(),
            mixing_coefficient: 0.7,
            provider_timeout_ms: 3000,
            provider_limit: 100,
            term: TermBounds::default(),
        }
    }
}

impl SearchConfig {
    /// Load and validate a TOML config file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SearchConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = self.mixing_coefficient;
        if !c.is_finite() || !(0.0..=1.0).contains(&c) {
            return Err(invalid("mixing_coefficient", format!("{} is outside [0, 1]", c)));
        }
        if self.provider_timeout_ms == 0 {
            return Err(invalid("provider_timeout_ms", "must be greater than zero"));
        }
        if self.provider_limit == 0 {
            return Err(invalid("provider_limit", "must be greater than zero"));
        }
        if self.term.min_length == 0 {
            return Err(invalid("term.min_length", "must be at least 1"));
        }
        if self.term.min_length > self.term.max_length {
            return Err(invalid(
                "term",
                format!(
                    "min_length {} exceeds max_length {}",
                    self.term.min_length, self.term.max_length
                ),
            ));
        }
        if self.security.max_results == 0 {
            return Err(invalid("security.max_results", "must be greater than zero"));
        }
        if self.security.batch_size == 0 {
            return Err(invalid("security.batch_size", "must be greater than zero"));
        }
        for (field, weight) in [
            ("providers.mutual_weight", self.providers.mutual_weight),
            ("providers.one_way_weight", self.providers.one_way_weight),
            ("providers.shared_connection_weight", self.providers.shared_connection_weight),
        ] {
            if !weight.is_finite() {
                return Err(invalid(field, format!("{} is not a finite number", weight)));
            }
        }
        if !self.thresholds.nearby_km.is_finite() || self.thresholds.nearby_km < 0.0 {
            return Err(invalid("thresholds.nearby_km", "must be a non-negative number"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}.toml", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mixing_coefficient, 0.7);
        assert_eq!(config.provider_timeout(), Duration::from_millis(3000));
        assert_eq!(config.term, TermBounds { min_length: 2, max_length: 50 });
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = write_temp(
            "search_partial",
            "mixing_coefficient = 0.9\n\n[security]\nmax_results = 5\ncontent_policy = false\n",
        );
        let config = SearchConfig::from_toml_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.mixing_coefficient, 0.9);
        assert_eq!(config.security.max_results, 5);
        assert!(!config.security.content_policy);
        assert!(config.security.blocked_users);
        assert_eq!(config.security.batch_size, 50);
        assert_eq!(config.related_weights, RankingWeights::related_defaults());
        assert_eq!(config.provider_limit, 100);
        assert_eq!(config.providers, ProviderWeights::default());
    }

    #[test]
    fn test_provider_weights_override() {
        let path = write_temp("search_providers", "[providers]\none_way_weight = 0.8\n");
        let config = SearchConfig::from_toml_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.providers.one_way_weight, 0.8);
        assert_eq!(config.providers.mutual_weight, 1.0);
        assert_eq!(config.providers.shared_connection_weight, 0.1);
    }

    #[test]
    fn test_weight_table_override() {
        let path = write_temp(
            "search_weights",
            "[unknown_weights]\nverified = 5.0\nmutual_follow = 0.0\nrequester_follows = 0.0\n\
             follows_requester = 0.0\nnearby = 0.0\npopular = 0.0\nblocked_by_target = -1.0\nmuted = -1.0\n",
        );
        let config = SearchConfig::from_toml_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.unknown_weights.verified, 5.0);
        assert_eq!(config.related_weights, RankingWeights::related_defaults());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let bad = [
            SearchConfig { mixing_coefficient: 1.2, ..Default::default() },
            SearchConfig { mixing_coefficient: f64::NAN, ..Default::default() },
            SearchConfig { provider_timeout_ms: 0, ..Default::default() },
            SearchConfig { term: TermBounds { min_length: 10, max_length: 5 }, ..Default::default() },
            SearchConfig { term: TermBounds { min_length: 0, max_length: 5 }, ..Default::default() },
            SearchConfig {
                providers: ProviderWeights { one_way_weight: f64::INFINITY, ..Default::default() },
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
        }
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let missing = SearchConfig::from_toml_file(Path::new("/nonexistent/search.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let path = write_temp("search_malformed", "mixing_coefficient = \"high\"\n");
        let malformed = SearchConfig::from_toml_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(malformed, Err(ConfigError::Parse { .. })));
    }
}
