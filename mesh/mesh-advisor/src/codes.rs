//! Error codes emitted by the intrinsic-quality and CAD-deviation detectors.
//!
//! Both detectors share one vocabulary. Codes the advisor's policy does not
//! know about are kept as [`ErrorCode::Other`] so they still count as
//! "some deviation" without ever matching a specific rule.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A symbolic mesh-quality or geometric problem detected on one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    /// Element is stretched far beyond the allowed aspect ratio.
    BadAspectRatio,
    /// Element angles deviate strongly from the ideal shape.
    HighSkewness,
    /// Element lies too far from the CAD reference surface.
    CadDeviationHigh,
    /// Abrupt size change between the element and its neighbours.
    BadTransition,
    /// Element area is below the minimum.
    SmallArea,
    /// An element edge has no neighbouring element where one is expected.
    MissingNeighbor,
    /// A node is not referenced by any element.
    OrphanNode,
    /// A code outside the advisor's policy vocabulary.
    Other(String),
}

impl ErrorCode {
    /// Canonical identifier as emitted by the detectors.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::BadAspectRatio => "BAD_ASPECT_RATIO",
            Self::HighSkewness => "HIGH_SKEWNESS",
            Self::CadDeviationHigh => "CAD_DEVIATION_HIGH",
            Self::BadTransition => "BAD_TRANSITION",
            Self::SmallArea => "SMALL_AREA",
            Self::MissingNeighbor => "MISSING_NEIGHBOR",
            Self::OrphanNode => "ORPHAN_NODE",
            Self::Other(code) => code,
        }
    }

    /// Whether this code describes a topological gap in the mesh.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::MissingNeighbor | Self::OrphanNode)
    }

    /// Whether this code is outside the advisor's policy vocabulary.
    #[must_use]
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "BAD_ASPECT_RATIO" => Self::BadAspectRatio,
            "HIGH_SKEWNESS" => Self::HighSkewness,
            "CAD_DEVIATION_HIGH" => Self::CadDeviationHigh,
            "BAD_TRANSITION" => Self::BadTransition,
            "SMALL_AREA" => Self::SmallArea,
            "MISSING_NEIGHBOR" => Self::MissingNeighbor,
            "ORPHAN_NODE" => Self::OrphanNode,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match Self::from(code.as_str()) {
            Self::Other(_) => Self::Other(code),
            known => known,
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for ErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of error codes reported for one element.
///
/// Detector origin is not tracked: the intrinsic and CAD sets are merged with
/// [`ErrorSet::union`] before the policy sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorSet(BTreeSet<ErrorCode>);

impl ErrorSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set union of two detector outputs. Duplicates collapse.
    #[must_use]
    pub fn union(a: &Self, b: &Self) -> Self {
        Self(a.0.union(&b.0).cloned().collect())
    }

    /// Add a code, returning `true` if it was not already present.
    pub fn insert(&mut self, code: ErrorCode) -> bool {
        self.0.insert(code)
    }

    /// Whether the set contains `code`.
    #[must_use]
    pub fn contains(&self, code: &ErrorCode) -> bool {
        self.0.contains(code)
    }

    /// Whether the set contains at least one of `codes`.
    #[must_use]
    pub fn contains_any(&self, codes: &[ErrorCode]) -> bool {
        codes.iter().any(|code| self.0.contains(code))
    }

    /// Whether any code in the set is a connectivity problem.
    #[must_use]
    pub fn has_connectivity_issue(&self) -> bool {
        self.0.iter().any(ErrorCode::is_connectivity)
    }

    /// Number of distinct codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no codes were reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate codes in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorCode> {
        self.0.iter()
    }
}

impl FromIterator<ErrorCode> for ErrorSet {
    fn from_iter<I: IntoIterator<Item = ErrorCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for ErrorSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(ErrorCode::from).collect()
    }
}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = &'a ErrorCode;
    type IntoIter = std::collections::btree_set::Iter<'a, ErrorCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_codes() {
        assert_eq!(ErrorCode::from("BAD_ASPECT_RATIO"), ErrorCode::BadAspectRatio);
        assert_eq!(ErrorCode::from("ORPHAN_NODE"), ErrorCode::OrphanNode);
        assert_eq!(
            "CAD_DEVIATION_HIGH".parse::<ErrorCode>(),
            Ok(ErrorCode::CadDeviationHigh)
        );
    }

    #[test]
    fn unknown_code_is_kept_verbatim() {
        let code = ErrorCode::from("WARPED_QUAD");
        assert!(code.is_unrecognized());
        assert_eq!(code.as_str(), "WARPED_QUAD");
        assert!(!code.is_connectivity());
    }

    #[test]
    fn codes_are_case_sensitive() {
        assert!(ErrorCode::from("small_area").is_unrecognized());
    }

    #[test]
    fn union_collapses_duplicates() {
        let intrinsic: ErrorSet = ["SMALL_AREA", "HIGH_SKEWNESS"].into_iter().collect();
        let cad: ErrorSet = ["SMALL_AREA", "CAD_DEVIATION_HIGH"].into_iter().collect();

        let all = ErrorSet::union(&intrinsic, &cad);
        assert_eq!(all.len(), 3);
        assert!(all.contains(&ErrorCode::CadDeviationHigh));
        assert!(all.contains_any(&[ErrorCode::BadTransition, ErrorCode::SmallArea]));
        assert!(!all.has_connectivity_issue());
    }

    #[test]
    fn connectivity_detection() {
        let set: ErrorSet = ["MISSING_NEIGHBOR"].into_iter().collect();
        assert!(set.has_connectivity_issue());
    }

    #[test]
    fn serializes_as_plain_strings() {
        let set: ErrorSet = ["SMALL_AREA", "CUSTOM_CHECK"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["SMALL_AREA","CUSTOM_CHECK"]"#);

        let parsed: ErrorSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }
}
