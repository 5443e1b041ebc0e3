//! Engine configuration and application constants.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Application-level constants
pub const APP_NAME: &str = "DynaMed";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "dynamed_core=info"
}

/// Score contributions and the recommendation threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoringWeights {
    /// Added per bundle indication the molecule treats
    pub indication_match: i32,
    /// Subtracted per bundle precaution the molecule carries
    pub precaution_match: i32,
    /// A molecule is recommended only when its score is strictly above this
    pub min_score: i32,
}

/// Errors loading an engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid log filter {filter:?}: {reason}")]
    InvalidLogFilter { filter: String, reason: String },
}

impl ScoringWeights {
    /// Match weights must not be negative. A negative indication weight
    /// would rank matches below non-matches.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indication_match < 0 {
            return Err(ConfigError::InvalidWeights(format!(
                "indication_match must be >= 0, got {}",
                self.indication_match
            )));
        }
        if self.precaution_match < 0 {
            return Err(ConfigError::InvalidWeights(format!(
                "precaution_match must be >= 0, got {}",
                self.precaution_match
            )));
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            indication_match: 2,
            precaution_match: 1,
            min_score: 0,
        }
    }
}

/// What prescription generation does when a molecule interacts with a line
/// already added.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Roll back the whole prescription and report the conflict
    #[default]
    Abort,
    /// Leave the molecule off and keep going
    Skip,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    pub conflict_policy: ConflictPolicy,
    /// `tracing` filter installed by `DynamedCore::init_logging`
    pub log_filter: String,
    /// Prefix of prescription references (`RX` gives `RX-00001`)
    pub reference_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringWeights::default(),
            conflict_policy: ConflictPolicy::default(),
            log_filter: default_log_filter().to_string(),
            reference_prefix: "RX".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.scoring.validate()?;
        config.env_filter()?;
        Ok(config)
    }

    /// Parse `log_filter` as a `tracing` env filter.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.log_filter).map_err(|e| ConfigError::InvalidLogFilter {
            filter: self.log_filter.clone(),
            reason: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
