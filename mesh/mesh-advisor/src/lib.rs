//! Remediation advisor for finite-element mesh QA.
//!
//! Turns per-element quality signals into one concrete, human-actionable
//! remediation step per element:
//!
//! - **Error codes** from the intrinsic-quality and CAD-deviation detectors
//! - **Anomaly score** from the unsupervised outlier model
//! - **Risk tier** (HIGH / MEDIUM / LOW) from the upstream classifier, or
//!   derived from the score
//!
//! The core is [`map_actions`], a deterministic policy with a strict
//! priority order: connectivity problems override everything, then the
//! risk-tier rules apply, and a manual-review fallback catches the rest.
//!
//! Around it sit batch assembly ([`recommend_elements`]), report I/O
//! ([`report`]) and before/after validation ([`validate_mesh_changes`]).
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Example
//!
//! ```
//! use mesh_advisor::{map_actions, Action, ErrorSet, RiskLevel};
//!
//! let intrinsic: ErrorSet = ["BAD_TRANSITION"].into_iter().collect();
//! let cad: ErrorSet = ["CAD_DEVIATION_HIGH"].into_iter().collect();
//!
//! let decision = map_actions(&intrinsic, &cad, 0.05, &RiskLevel::Medium);
//!
//! // Both medium-risk rules fire; the first one is surfaced.
//! assert_eq!(decision.primary_action, Action::RefineLocally);
//! assert_eq!(decision.reasons, ["Poor mesh transition", "CAD mismatch"]);
//! assert_eq!(decision.confidence, 0.6);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod action;
mod assembler;
mod codes;
mod config;
mod error;
mod mapper;
pub mod report;
mod risk;
mod validation;

pub use action::{Action, ActionDecision};
pub use assembler::{
    ElementSignals, Recommendation, RecommendationReport, recommend_element, recommend_elements,
};
pub use codes::{ErrorCode, ErrorSet};
pub use config::AdvisorConfig;
pub use error::{AdvisorError, AdvisorResult};
pub use mapper::{DecisionPolicy, FallbackConfidence, map_actions, map_actions_with_policy};
pub use risk::{RiskLevel, RiskThresholds};
pub use validation::{
    ElementSnapshot, ValidationMetrics, ValidationOptions, validate_mesh_changes,
};
