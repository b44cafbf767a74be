//! Batch recommendation assembly.
//!
//! Runs the action mapper once per element and collects one
//! [`Recommendation`] row per element into a [`RecommendationReport`].

use std::collections::BTreeMap;
use std::fmt;

use hashbrown::HashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::Action;
use crate::codes::{ErrorCode, ErrorSet};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, AdvisorResult};
use crate::mapper::map_actions_with_policy;
use crate::risk::RiskLevel;

/// Everything the advisor knows about one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSignals {
    /// Mesh element identifier.
    pub element_id: u64,
    /// Codes from the intrinsic-quality detector.
    #[serde(default)]
    pub intrinsic_errors: ErrorSet,
    /// Codes from the CAD-deviation detector.
    #[serde(default)]
    pub cad_errors: ErrorSet,
    /// Anomaly model output.
    pub anomaly_score: f64,
    /// Risk tier from the upstream classifier. Derived from the score when
    /// absent.
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
}

impl ElementSignals {
    /// Create signals for an element with no detector codes.
    #[must_use]
    pub fn new(element_id: u64, anomaly_score: f64) -> Self {
        Self {
            element_id,
            intrinsic_errors: ErrorSet::new(),
            cad_errors: ErrorSet::new(),
            anomaly_score,
            risk_level: None,
        }
    }

    /// Set the intrinsic detector codes.
    #[must_use]
    pub fn with_intrinsic_errors<I, C>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ErrorCode>,
    {
        self.intrinsic_errors = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the CAD detector codes.
    #[must_use]
    pub fn with_cad_errors<I, C>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ErrorCode>,
    {
        self.cad_errors = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the risk tier.
    #[must_use]
    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = Some(risk_level);
        self
    }
}

/// One row of the recommendations table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Mesh element identifier.
    pub element_id: u64,
    /// The action surfaced to the engineer.
    pub primary_action: Action,
    /// Every accumulated action, primary first.
    pub actions: Vec<Action>,
    /// Justification per action.
    pub reasons: Vec<String>,
    /// Confidence in `[0, 0.95]`.
    pub confidence: f64,
    /// Risk tier the decision was made under.
    pub severity: RiskLevel,
    /// Anomaly model output.
    pub anomaly_score: f64,
    /// Merged detector codes.
    pub error_codes: ErrorSet,
}

impl Recommendation {
    /// Whether this row is acted on and validated (MEDIUM or HIGH).
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.severity.is_actionable()
    }

    /// Reasons joined into one table cell.
    #[must_use]
    pub fn joined_reasons(&self, separator: &str) -> String {
        self.reasons.join(separator)
    }
}

/// Produce the recommendation for one element.
///
/// # Example
///
/// ```
/// use mesh_advisor::{recommend_element, Action, AdvisorConfig, ElementSignals, RiskLevel};
///
/// let signals = ElementSignals::new(7, 0.2);
/// let rec = recommend_element(&signals, &AdvisorConfig::default());
///
/// // No tier supplied: 0.2 classifies as HIGH and the score triggers a remesh.
/// assert_eq!(rec.severity, RiskLevel::High);
/// assert_eq!(rec.primary_action, Action::DeleteAndRemesh);
/// ```
#[must_use]
pub fn recommend_element(signals: &ElementSignals, config: &AdvisorConfig) -> Recommendation {
    let severity = signals
        .risk_level
        .clone()
        .unwrap_or_else(|| config.thresholds.classify(signals.anomaly_score));

    let decision = map_actions_with_policy(
        &signals.intrinsic_errors,
        &signals.cad_errors,
        signals.anomaly_score,
        &severity,
        &config.policy,
    );

    Recommendation {
        element_id: signals.element_id,
        primary_action: decision.primary_action,
        actions: decision.actions,
        reasons: decision.reasons,
        confidence: decision.confidence,
        severity,
        anomaly_score: signals.anomaly_score,
        error_codes: ErrorSet::union(&signals.intrinsic_errors, &signals.cad_errors),
    }
}

/// Produce recommendations for every element, in input order.
///
/// Elements are mapped in parallel; each decision is independent.
///
/// # Errors
///
/// Returns [`AdvisorError::DuplicateElement`] if an element id appears more
/// than once, or [`AdvisorError::InvalidConfig`] if `config` is invalid.
pub fn recommend_elements(
    elements: &[ElementSignals],
    config: &AdvisorConfig,
) -> AdvisorResult<RecommendationReport> {
    config.validate()?;
    check_unique_ids(elements)?;

    let classified = elements.iter().filter(|e| e.risk_level.is_none()).count();
    debug!(
        elements = elements.len(),
        classified, "Assembling recommendations"
    );

    let recommendations: Vec<Recommendation> = elements
        .par_iter()
        .map(|signals| recommend_element(signals, config))
        .collect();

    let report = RecommendationReport::from_recommendations(recommendations);
    info!(
        elements = report.len(),
        actionable = report.actionable().count(),
        "Generated recommendations"
    );

    Ok(report)
}

fn check_unique_ids(elements: &[ElementSignals]) -> AdvisorResult<()> {
    let mut seen: HashSet<u64> = HashSet::with_capacity(elements.len());
    for signals in elements {
        if !seen.insert(signals.element_id) {
            return Err(AdvisorError::DuplicateElement {
                element_id: signals.element_id,
            });
        }
    }
    Ok(())
}

/// Recommendations for one mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationReport {
    /// One row per element, in input order.
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationReport {
    /// Wrap existing rows.
    #[must_use]
    pub fn from_recommendations(recommendations: Vec<Recommendation>) -> Self {
        Self { recommendations }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    /// Whether the report has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    /// Rows at MEDIUM or HIGH severity.
    pub fn actionable(&self) -> impl Iterator<Item = &Recommendation> {
        self.recommendations.iter().filter(|r| r.is_actionable())
    }

    /// Number of rows per primary action.
    #[must_use]
    pub fn action_counts(&self) -> BTreeMap<Action, usize> {
        let mut counts = BTreeMap::new();
        for rec in &self.recommendations {
            *counts.entry(rec.primary_action).or_insert(0) += 1;
        }
        counts
    }

    /// Number of rows per severity label.
    #[must_use]
    pub fn severity_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for rec in &self.recommendations {
            *counts.entry(rec.severity.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Look up the row for an element.
    #[must_use]
    pub fn get(&self, element_id: u64) -> Option<&Recommendation> {
        self.recommendations
            .iter()
            .find(|r| r.element_id == element_id)
    }
}

impl fmt::Display for RecommendationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recommendation Report:")?;
        writeln!(f, "  Elements: {}", self.len())?;
        writeln!(f, "  Actionable: {}", self.actionable().count())?;

        let severities = self.severity_counts();
        if !severities.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Severity:")?;
            for (label, count) in &severities {
                writeln!(f, "    {label}: {count}")?;
            }
        }

        let actions = self.action_counts();
        if !actions.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Actions:")?;
            for (action, count) in &actions {
                writeln!(f, "    {action}: {count}")?;
            }
        }

        Ok(())
    }
}
