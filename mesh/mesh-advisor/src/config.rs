//! Advisor configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AdvisorError, AdvisorResult};
use crate::mapper::{DecisionPolicy, FallbackConfidence};
use crate::risk::RiskThresholds;

/// Configuration for a recommendation run.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use mesh_advisor::AdvisorConfig;
///
/// let config: AdvisorConfig =
///     serde_json::from_str(r#"{ "thresholds": { "high": 0.2 } }"#).unwrap();
/// assert_eq!(config.thresholds.high, 0.2);
/// assert_eq!(config.thresholds.medium, 0.0);
/// assert_eq!(config.policy.max_confidence, 0.95);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Decision policy parameters.
    pub policy: DecisionPolicy,
    /// Cut-offs for elements that arrive without a risk tier.
    pub thresholds: RiskThresholds,
}

impl AdvisorConfig {
    /// Load and validate a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`AdvisorConfig::validate`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> AdvisorResult<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "Loaded advisor config");
        Ok(config)
    }

    /// Set the decision policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the risk classification thresholds.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Check that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> AdvisorResult<()> {
        let policy = &self.policy;

        if !policy.severe_score_threshold.is_finite() || !policy.base_confidence.is_finite() {
            return Err(AdvisorError::invalid_config("policy values must be finite"));
        }
        if !(0.0..=1.0).contains(&policy.max_confidence) {
            return Err(AdvisorError::invalid_config(format!(
                "max_confidence {} outside [0, 1]",
                policy.max_confidence
            )));
        }
        if policy.base_confidence > policy.max_confidence {
            return Err(AdvisorError::invalid_config(format!(
                "base_confidence {} exceeds max_confidence {}",
                policy.base_confidence, policy.max_confidence
            )));
        }
        if let FallbackConfidence::Fixed(c) = policy.fallback {
            if !(0.0..=policy.max_confidence).contains(&c) {
                return Err(AdvisorError::invalid_config(format!(
                    "fallback confidence {c} outside [0, {}]",
                    policy.max_confidence
                )));
            }
        }
        if !self.thresholds.is_valid() {
            return Err(AdvisorError::invalid_config(format!(
                "risk thresholds must be finite with medium <= high (medium {}, high {})",
                self.thresholds.medium, self.thresholds.high
            )));
        }

        Ok(())
    }
}
