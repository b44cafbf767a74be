//! Effectiveness metrics for applied recommendations.
//!
//! Compares the mesh before and after remediation and measures how often
//! the elements the advisor flagged were actually changed, and whether the
//! change improved them. Only MEDIUM and HIGH rows are considered.

use std::fmt;

use hashbrown::HashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assembler::Recommendation;

/// State of one element in a mesh snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Mesh element identifier.
    pub element_id: u64,
    /// Element centroid.
    pub centroid: [f64; 3],
    /// Distortion measure; lower is better.
    pub quality: f64,
}

impl ElementSnapshot {
    /// Create a snapshot entry.
    #[must_use]
    pub const fn new(element_id: u64, centroid: [f64; 3], quality: f64) -> Self {
        Self {
            element_id,
            centroid,
            quality,
        }
    }

    fn position(&self) -> Point3<f64> {
        Point3::from(self.centroid)
    }
}

/// Options for change validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Centroid displacement above which an element counts as changed.
    pub move_tolerance: f64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            move_tolerance: 1e-9,
        }
    }
}

/// Aggregate effectiveness of a set of recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationMetrics {
    /// Fraction of flagged elements that were changed or removed.
    pub change_hit_rate: f64,
    /// Fraction of flagged elements still present whose quality improved.
    pub quality_improvement_rate: f64,
    /// Mean centroid displacement of flagged elements still present.
    pub avg_change_magnitude: f64,
    /// Actionable recommendations considered.
    pub actionable_count: usize,
    /// Flagged elements that were changed or removed.
    pub changed_count: usize,
    /// Flagged elements absent from the final mesh.
    pub removed_count: usize,
    /// Flagged elements whose quality improved.
    pub improved_count: usize,
    /// Flagged elements absent from the initial mesh.
    pub missing_elements: usize,
}

impl fmt::Display for ValidationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Change hit rate          : {:.3}", self.change_hit_rate)?;
        writeln!(
            f,
            "Quality improvement rate : {:.3}",
            self.quality_improvement_rate
        )?;
        writeln!(f, "Avg change magnitude     : {:.3}", self.avg_change_magnitude)
    }
}

/// Measure how the flagged elements changed between two mesh states.
///
/// An element counts as changed if it is absent from `after` or its
/// centroid moved more than `options.move_tolerance`. Rates with an empty
/// denominator are zero.
///
/// # Example
///
/// ```
/// use mesh_advisor::{
///     recommend_elements, validate_mesh_changes, AdvisorConfig, ElementSignals,
///     ElementSnapshot, RiskLevel, ValidationOptions,
/// };
///
/// let signals = vec![
///     ElementSignals::new(1, 0.3).with_risk_level(RiskLevel::High),
///     ElementSignals::new(2, 0.0).with_risk_level(RiskLevel::Low),
/// ];
/// let report = recommend_elements(&signals, &AdvisorConfig::default()).unwrap();
///
/// let before = vec![
///     ElementSnapshot::new(1, [0.0, 0.0, 0.0], 4.0),
///     ElementSnapshot::new(2, [1.0, 0.0, 0.0], 1.0),
/// ];
/// let after = vec![
///     ElementSnapshot::new(1, [0.0, 0.5, 0.0], 1.5),
///     ElementSnapshot::new(2, [1.0, 0.0, 0.0], 1.0),
/// ];
///
/// let metrics = validate_mesh_changes(
///     &before,
///     &after,
///     &report.recommendations,
///     &ValidationOptions::default(),
/// );
/// assert_eq!(metrics.actionable_count, 1);
/// assert_eq!(metrics.change_hit_rate, 1.0);
/// assert_eq!(metrics.quality_improvement_rate, 1.0);
/// ```
#[must_use]
pub fn validate_mesh_changes(
    before: &[ElementSnapshot],
    after: &[ElementSnapshot],
    recommendations: &[Recommendation],
    options: &ValidationOptions,
) -> ValidationMetrics {
    let before_by_id: HashMap<u64, &ElementSnapshot> =
        before.iter().map(|s| (s.element_id, s)).collect();
    let after_by_id: HashMap<u64, &ElementSnapshot> =
        after.iter().map(|s| (s.element_id, s)).collect();

    let mut metrics = ValidationMetrics::default();
    let mut evaluated = 0usize;
    let mut persisted = 0usize;
    let mut total_displacement = 0.0;

    for rec in recommendations.iter().filter(|r| r.is_actionable()) {
        metrics.actionable_count += 1;

        let Some(old) = before_by_id.get(&rec.element_id) else {
            metrics.missing_elements += 1;
            continue;
        };
        evaluated += 1;

        let Some(new) = after_by_id.get(&rec.element_id) else {
            metrics.removed_count += 1;
            metrics.changed_count += 1;
            continue;
        };
        persisted += 1;

        let displacement = (new.position() - old.position()).norm();
        total_displacement += displacement;

        if displacement > options.move_tolerance {
            metrics.changed_count += 1;
        }
        if new.quality < old.quality {
            metrics.improved_count += 1;
        }
    }

    if metrics.missing_elements > 0 {
        warn!(
            missing = metrics.missing_elements,
            "Recommendations reference elements absent from the initial mesh"
        );
    }

    metrics.change_hit_rate = ratio(metrics.changed_count, evaluated);
    metrics.quality_improvement_rate = ratio(metrics.improved_count, persisted);
    metrics.avg_change_magnitude = if persisted == 0 {
        0.0
    } else {
        total_displacement / count_as_f64(persisted)
    };

    debug!(
        actionable = metrics.actionable_count,
        changed = metrics.changed_count,
        removed = metrics.removed_count,
        improved = metrics.improved_count,
        "Validated mesh changes"
    );

    metrics
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        count_as_f64(numerator) / count_as_f64(denominator)
    }
}

#[allow(clippy::cast_precision_loss)]
// Element counts stay far below 2^52
fn count_as_f64(count: usize) -> f64 {
    count as f64
}
