//! Risk tiers and score-based tier classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse severity tier for one element.
///
/// Labels other than `HIGH`, `MEDIUM` and `LOW` are preserved as
/// [`RiskLevel::Unrecognized`] and receive the low-risk treatment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    /// Severe deviation; the element likely needs rebuilding.
    High,
    /// Moderate deviation; local refinement or CAD snapping.
    Medium,
    /// Element within the learned distribution.
    Low,
    /// A label the advisor does not know, kept verbatim.
    Unrecognized(String),
}

impl RiskLevel {
    /// Label as written in reports.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Unrecognized(label) => label,
        }
    }

    /// Whether recommendations at this tier are acted on and validated.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::High | Self::Medium)
    }
}

impl From<&str> for RiskLevel {
    fn from(label: &str) -> Self {
        match label {
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            "LOW" => Self::Low,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        match Self::from(label.as_str()) {
            Self::Unrecognized(_) => Self::Unrecognized(label),
            known => known,
        }
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Unrecognized(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score cut-offs used when no risk tier was supplied for an element.
///
/// Scores are negated isolation-forest decision values: positive means
/// outlier.
///
/// # Example
///
/// ```
/// use mesh_advisor::{RiskLevel, RiskThresholds};
///
/// let thresholds = RiskThresholds::default();
/// assert_eq!(thresholds.classify(0.2), RiskLevel::High);
/// assert_eq!(thresholds.classify(0.05), RiskLevel::Medium);
/// assert_eq!(thresholds.classify(-0.1), RiskLevel::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Scores strictly above this are HIGH.
    pub high: f64,
    /// Scores strictly above this (and not HIGH) are MEDIUM.
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 0.15,
            medium: 0.0,
        }
    }
}

impl RiskThresholds {
    /// Create thresholds with explicit cut-offs.
    #[must_use]
    pub const fn new(high: f64, medium: f64) -> Self {
        Self { high, medium }
    }

    /// Classify a raw anomaly score. `NaN` is LOW.
    #[must_use]
    pub fn classify(&self, score: f64) -> RiskLevel {
        if score > self.high {
            RiskLevel::High
        } else if score > self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Whether both cut-offs are finite and ordered.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.high.is_finite() && self.medium.is_finite() && self.medium <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_tiers() {
        assert_eq!(RiskLevel::from("HIGH"), RiskLevel::High);
        assert_eq!(RiskLevel::from("MEDIUM"), RiskLevel::Medium);
        assert_eq!(RiskLevel::from("LOW"), RiskLevel::Low);
    }

    #[test]
    fn unknown_label_is_preserved() {
        let level: RiskLevel = "CRITICAL".parse().unwrap();
        assert_eq!(level, RiskLevel::Unrecognized("CRITICAL".to_string()));
        assert_eq!(level.to_string(), "CRITICAL");
        assert!(!level.is_actionable());
    }

    #[test]
    fn lowercase_is_unrecognized() {
        assert!(matches!(RiskLevel::from("high"), RiskLevel::Unrecognized(_)));
    }

    #[test]
    fn actionable_tiers() {
        assert!(RiskLevel::High.is_actionable());
        assert!(RiskLevel::Medium.is_actionable());
        assert!(!RiskLevel::Low.is_actionable());
    }

    #[test]
    fn classify_boundaries_are_strict() {
        let t = RiskThresholds::default();
        assert_eq!(t.classify(0.15), RiskLevel::Medium);
        assert_eq!(t.classify(0.0), RiskLevel::Low);
        assert_eq!(t.classify(f64::NAN), RiskLevel::Low);
        assert_eq!(t.classify(f64::INFINITY), RiskLevel::High);
    }

    #[test]
    fn threshold_validity() {
        assert!(RiskThresholds::default().is_valid());
        assert!(!RiskThresholds::new(0.1, 0.2).is_valid());
        assert!(!RiskThresholds::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn serde_round_trip_label() {
        let json = serde_json::to_string(&RiskLevel::Medium).unwrap();
        assert_eq!(json, r#""MEDIUM""#);
        let parsed: RiskLevel = serde_json::from_str(r#""UNKNOWN""#).unwrap();
        assert_eq!(parsed, RiskLevel::Unrecognized("UNKNOWN".to_string()));
    }
}
