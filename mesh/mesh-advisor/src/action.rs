//! Remediation actions and the per-element decision record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete remediation step an engineer can take on one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    /// Remove the element and regenerate the surrounding patch.
    #[serde(rename = "DELETE & REMESH")]
    DeleteAndRemesh,
    /// Project the element's nodes back onto the CAD surface.
    #[serde(rename = "MOVE NODES TO CAD")]
    MoveNodesToCad,
    /// Refine the mesh around the element.
    #[serde(rename = "REFINE LOCALLY")]
    RefineLocally,
    /// Keep the element but watch it in later iterations.
    #[serde(rename = "MONITOR")]
    Monitor,
    /// Nothing to do.
    #[serde(rename = "NO ACTION")]
    NoAction,
    /// Repair missing neighbour links or orphaned nodes.
    #[serde(rename = "ADD CONNECTIVITY")]
    AddConnectivity,
    /// No rule matched; an engineer must inspect the element.
    #[serde(rename = "REVIEW MANUALLY")]
    ReviewManually,
}

impl Action {
    /// Every action, in vocabulary order.
    pub const ALL: [Self; 7] = [
        Self::DeleteAndRemesh,
        Self::MoveNodesToCad,
        Self::RefineLocally,
        Self::Monitor,
        Self::NoAction,
        Self::AddConnectivity,
        Self::ReviewManually,
    ];

    /// Label as written in reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteAndRemesh => "DELETE & REMESH",
            Self::MoveNodesToCad => "MOVE NODES TO CAD",
            Self::RefineLocally => "REFINE LOCALLY",
            Self::Monitor => "MONITOR",
            Self::NoAction => "NO ACTION",
            Self::AddConnectivity => "ADD CONNECTIVITY",
            Self::ReviewManually => "REVIEW MANUALLY",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The advisor's verdict for one element.
///
/// `actions` and `reasons` are in evaluation order and always have the same
/// length. Only the first action is surfaced as `primary_action`; a
/// medium-risk element can carry a second one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDecision {
    /// The first accumulated action.
    pub primary_action: Action,
    /// All accumulated actions.
    pub actions: Vec<Action>,
    /// Human-readable justification for each action.
    pub reasons: Vec<String>,
    /// Confidence in `[0, 0.95]`, two decimal places.
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_vocabulary() {
        let labels: Vec<_> = Action::ALL.iter().map(Action::as_str).collect();
        assert_eq!(
            labels,
            [
                "DELETE & REMESH",
                "MOVE NODES TO CAD",
                "REFINE LOCALLY",
                "MONITOR",
                "NO ACTION",
                "ADD CONNECTIVITY",
                "REVIEW MANUALLY",
            ]
        );
    }

    #[test]
    fn serde_uses_report_labels() {
        for action in Action::ALL {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
            let parsed: Action = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, action);
        }
    }
}
