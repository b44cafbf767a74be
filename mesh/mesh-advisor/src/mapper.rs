//! Risk-to-action decision engine.
//!
//! Fuses the merged detector codes, the anomaly score and the risk tier of a
//! single element into one prioritized remediation action.
//!
//! Evaluation runs as fixed stages over an ordered result builder:
//!
//! 1. **Risk tier rules** append zero, one or two actions.
//! 2. **Connectivity override** replaces everything when the element has a
//!    missing neighbour or an orphan node, regardless of tier or score.
//! 3. **Confidence** is `min(max_confidence, base_confidence + score)`.
//! 4. **Fallback** fills an empty builder with `REVIEW MANUALLY` and
//!    replaces the confidence per [`FallbackConfidence`].
//!
//! The engine is a pure function: no I/O, no shared state, no failure path.
//! It is safe to call concurrently for every element of a mesh.

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionDecision};
use crate::codes::{ErrorCode, ErrorSet};
use crate::risk::RiskLevel;

const REASON_SEVERE_DISTORTION: &str = "Severely distorted element";
const REASON_LARGE_CAD_DEVIATION: &str = "Large CAD deviation";
const REASON_POOR_TRANSITION: &str = "Poor mesh transition";
const REASON_CAD_MISMATCH: &str = "CAD mismatch";
const REASON_MINOR_DEVIATIONS: &str = "Minor deviations detected";
const REASON_WITHIN_DISTRIBUTION: &str = "Mesh within learned distribution";
const REASON_CONNECTIVITY: &str = "Mesh connectivity issue detected";
const REASON_UNCLASSIFIED: &str = "Unclassified anomaly pattern detected";

/// Confidence reported when no rule produced an action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackConfidence {
    /// Report this fixed value regardless of the score.
    Fixed(f64),
    /// Report the score-derived confidence like every other branch.
    Computed,
}

impl Default for FallbackConfidence {
    fn default() -> Self {
        Self::Fixed(0.6)
    }
}

/// Numeric parameters of the decision policy.
///
/// The defaults reproduce the production policy exactly.
///
/// # Example
///
/// ```
/// use mesh_advisor::{DecisionPolicy, FallbackConfidence};
///
/// let policy = DecisionPolicy::default();
/// assert_eq!(policy.severe_score_threshold, 0.15);
/// assert_eq!(policy.fallback, FallbackConfidence::Fixed(0.6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// HIGH-risk elements scoring strictly above this are remeshed even
    /// without a distortion code.
    pub severe_score_threshold: f64,
    /// Confidence offset added to the anomaly score.
    pub base_confidence: f64,
    /// Upper bound on reported confidence.
    pub max_confidence: f64,
    /// Confidence used by the fallback stage.
    pub fallback: FallbackConfidence,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            severe_score_threshold: 0.15,
            base_confidence: 0.55,
            max_confidence: 0.95,
            fallback: FallbackConfidence::default(),
        }
    }
}

impl DecisionPolicy {
    /// Set the fallback confidence behaviour.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: FallbackConfidence) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the severe anomaly score threshold.
    #[must_use]
    pub const fn with_severe_score_threshold(mut self, threshold: f64) -> Self {
        self.severe_score_threshold = threshold;
        self
    }

    /// Whether all parameters are finite and the confidence bounds are
    /// consistent.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let fallback_ok = match self.fallback {
            FallbackConfidence::Fixed(c) => (0.0..=self.max_confidence).contains(&c),
            FallbackConfidence::Computed => true,
        };

        self.severe_score_threshold.is_finite()
            && self.base_confidence.is_finite()
            && (0.0..=1.0).contains(&self.max_confidence)
            && self.base_confidence <= self.max_confidence
            && fallback_ok
    }
}

/// Ordered accumulator of `(action, reason)` pairs.
#[derive(Debug, Default)]
struct DecisionBuilder {
    actions: Vec<Action>,
    reasons: Vec<&'static str>,
}

impl DecisionBuilder {
    fn push(&mut self, action: Action, reason: &'static str) {
        self.actions.push(action);
        self.reasons.push(reason);
    }

    fn replace(&mut self, action: Action, reason: &'static str) {
        self.actions.clear();
        self.reasons.clear();
        self.push(action, reason);
    }

    fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn finish(self, confidence: f64) -> ActionDecision {
        // The fallback stage leaves at least one action.
        let primary_action = self
            .actions
            .first()
            .copied()
            .unwrap_or(Action::ReviewManually);

        ActionDecision {
            primary_action,
            actions: self.actions,
            reasons: self.reasons.into_iter().map(str::to_string).collect(),
            confidence: round_confidence(confidence),
        }
    }
}

/// Map one element's signals to a remediation decision using the default
/// policy.
///
/// # Example
///
/// ```
/// use mesh_advisor::{map_actions, Action, ErrorSet, RiskLevel};
///
/// let intrinsic: ErrorSet = ["BAD_ASPECT_RATIO"].into_iter().collect();
/// let cad = ErrorSet::new();
///
/// let decision = map_actions(&intrinsic, &cad, 0.0, &RiskLevel::High);
/// assert_eq!(decision.primary_action, Action::DeleteAndRemesh);
/// assert_eq!(decision.confidence, 0.55);
/// ```
#[must_use]
pub fn map_actions(
    intrinsic_errors: &ErrorSet,
    cad_errors: &ErrorSet,
    anomaly_score: f64,
    risk_level: &RiskLevel,
) -> ActionDecision {
    map_actions_with_policy(
        intrinsic_errors,
        cad_errors,
        anomaly_score,
        risk_level,
        &DecisionPolicy::default(),
    )
}

/// Map one element's signals to a remediation decision.
#[must_use]
pub fn map_actions_with_policy(
    intrinsic_errors: &ErrorSet,
    cad_errors: &ErrorSet,
    anomaly_score: f64,
    risk_level: &RiskLevel,
    policy: &DecisionPolicy,
) -> ActionDecision {
    let all_errors = ErrorSet::union(intrinsic_errors, cad_errors);
    let mut builder = DecisionBuilder::default();

    evaluate_risk_tier(&all_errors, anomaly_score, risk_level, policy, &mut builder);
    apply_connectivity_override(&all_errors, &mut builder);

    let mut confidence = compute_confidence(anomaly_score, policy);
    if apply_fallback(&mut builder) {
        if let FallbackConfidence::Fixed(forced) = policy.fallback {
            confidence = forced;
        }
    }

    builder.finish(confidence)
}

/// Tier-specific rules. HIGH and MEDIUM may produce nothing; the low-risk
/// branch always produces one action.
fn evaluate_risk_tier(
    errors: &ErrorSet,
    anomaly_score: f64,
    risk_level: &RiskLevel,
    policy: &DecisionPolicy,
    builder: &mut DecisionBuilder,
) {
    match risk_level {
        RiskLevel::High => {
            let distorted = errors
                .contains_any(&[ErrorCode::BadAspectRatio, ErrorCode::HighSkewness])
                || anomaly_score > policy.severe_score_threshold;

            if distorted {
                builder.push(Action::DeleteAndRemesh, REASON_SEVERE_DISTORTION);
            } else if errors.contains(&ErrorCode::CadDeviationHigh) {
                builder.push(Action::MoveNodesToCad, REASON_LARGE_CAD_DEVIATION);
            }
        }
        RiskLevel::Medium => {
            // Both checks are independent; order fixes the primary action.
            if errors.contains_any(&[ErrorCode::BadTransition, ErrorCode::SmallArea]) {
                builder.push(Action::RefineLocally, REASON_POOR_TRANSITION);
            }
            if errors.contains(&ErrorCode::CadDeviationHigh) {
                builder.push(Action::MoveNodesToCad, REASON_CAD_MISMATCH);
            }
        }
        RiskLevel::Low | RiskLevel::Unrecognized(_) => {
            if errors.is_empty() {
                builder.push(Action::NoAction, REASON_WITHIN_DISTRIBUTION);
            } else {
                builder.push(Action::Monitor, REASON_MINOR_DEVIATIONS);
            }
        }
    }
}

/// A mesh with topological gaps cannot be judged geometrically, so a
/// connectivity code discards every tier decision.
fn apply_connectivity_override(errors: &ErrorSet, builder: &mut DecisionBuilder) {
    if errors.has_connectivity_issue() {
        builder.replace(Action::AddConnectivity, REASON_CONNECTIVITY);
    }
}

/// `min(max_confidence, base_confidence + score)`, floored at zero.
/// A `NaN` score yields `max_confidence`.
fn compute_confidence(anomaly_score: f64, policy: &DecisionPolicy) -> f64 {
    (policy.base_confidence + anomaly_score)
        .min(policy.max_confidence)
        .max(0.0)
}

/// Fill an empty builder with `REVIEW MANUALLY`. Returns whether it fired.
fn apply_fallback(builder: &mut DecisionBuilder) -> bool {
    if !builder.is_empty() {
        return false;
    }

    builder.push(Action::ReviewManually, REASON_UNCLASSIFIED);
    true
}

/// Two decimal places, rounded from the exact stored value with ties to
/// even. Scaling by 100 first can land on a midpoint the stored value never
/// reached (`0.615` is stored just below it).
fn round_confidence(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
