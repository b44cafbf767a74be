//! Mesh remediation advisor CLI.
//!
//! # Commands
//!
//! - `mesh-advisor recommend` - Turn element signals into a recommendations table
//! - `mesh-advisor validate` - Measure how flagged elements changed after remediation
//! - `mesh-advisor map` - Decide a single element from the command line
//!
//! Logging goes to stderr and honours `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mesh_advisor::report::{
    load_recommendations_json, load_signals_json, load_snapshots_json, save_recommendations_csv,
    save_recommendations_json,
};
use mesh_advisor::{
    ActionDecision, AdvisorConfig, ErrorSet, RecommendationReport, RiskLevel, ValidationMetrics,
    ValidationOptions, map_actions_with_policy, recommend_elements, validate_mesh_changes,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Finite-element mesh remediation advisor
#[derive(Parser)]
#[command(name = "mesh-advisor")]
#[command(about = "Recommend one remediation action per mesh element", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate recommendations from per-element signals
    Recommend {
        /// JSON array of element signals
        #[arg(long)]
        signals: PathBuf,

        /// Output CSV path
        #[arg(long)]
        out: PathBuf,

        /// Also write recommendations as JSON (input for `validate`)
        #[arg(long)]
        json: Option<PathBuf>,

        /// Advisor configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare mesh states before and after applying recommendations
    Validate {
        /// Recommendations JSON written by `recommend --json`
        #[arg(long)]
        recommendations: PathBuf,

        /// Element snapshots of the initial mesh (JSON)
        #[arg(long)]
        before: PathBuf,

        /// Element snapshots of the final mesh (JSON)
        #[arg(long)]
        after: PathBuf,

        /// Centroid displacement above which an element counts as changed
        #[arg(long)]
        move_tolerance: Option<f64>,
    },

    /// Decide a single element and print the decision as JSON
    Map {
        /// Risk tier label (HIGH, MEDIUM, LOW; anything else is treated as LOW)
        #[arg(long)]
        risk: String,

        /// Anomaly score
        #[arg(long, allow_hyphen_values = true)]
        score: f64,

        /// Intrinsic detector codes
        #[arg(long, num_args = 0..)]
        intrinsic: Vec<String>,

        /// CAD detector codes
        #[arg(long, num_args = 0..)]
        cad: Vec<String>,

        /// Advisor configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recommend {
            signals,
            out,
            json,
            config,
        } => {
            let report = recommend(&signals, &out, json.as_deref(), config.as_deref())?;
            println!("{report}");
        }
        Commands::Validate {
            recommendations,
            before,
            after,
            move_tolerance,
        } => {
            if let Some(metrics) = validate(&recommendations, &before, &after, move_tolerance)? {
                println!("VALIDATION METRICS");
                println!("------------------");
                print!("{metrics}");
            }
        }
        Commands::Map {
            risk,
            score,
            intrinsic,
            cad,
            config,
        } => {
            let decision = map(&risk, score, &intrinsic, &cad, config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AdvisorConfig> {
    match path {
        Some(path) => AdvisorConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AdvisorConfig::default()),
    }
}

fn recommend(
    signals_path: &Path,
    out: &Path,
    json: Option<&Path>,
    config: Option<&Path>,
) -> Result<RecommendationReport> {
    let config = load_config(config)?;
    let signals = load_signals_json(signals_path)
        .with_context(|| format!("failed to load signals {}", signals_path.display()))?;

    let report =
        recommend_elements(&signals, &config).context("failed to assemble recommendations")?;

    save_recommendations_csv(&report, out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    if let Some(json) = json {
        save_recommendations_json(&report, json)
            .with_context(|| format!("failed to write {}", json.display()))?;
    }

    info!(path = %out.display(), "Recommendations generated");
    Ok(report)
}

/// `None` when no row is actionable.
fn validate(
    recommendations: &Path,
    before: &Path,
    after: &Path,
    move_tolerance: Option<f64>,
) -> Result<Option<ValidationMetrics>> {
    let mut options = ValidationOptions::default();
    if let Some(tolerance) = move_tolerance {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            bail!("move tolerance must be a non-negative number, got {tolerance}");
        }
        options.move_tolerance = tolerance;
    }

    let report = load_recommendations_json(recommendations)
        .with_context(|| format!("failed to load {}", recommendations.display()))?;
    let before = load_snapshots_json(before)
        .with_context(|| format!("failed to load {}", before.display()))?;
    let after = load_snapshots_json(after)
        .with_context(|| format!("failed to load {}", after.display()))?;

    let actionable = report.actionable().count();
    info!(actionable, "Actionable elements");
    if actionable == 0 {
        warn!("No actionable elements found; nothing to validate");
        return Ok(None);
    }

    Ok(Some(validate_mesh_changes(
        &before,
        &after,
        &report.recommendations,
        &options,
    )))
}

fn map(
    risk: &str,
    score: f64,
    intrinsic: &[String],
    cad: &[String],
    config: Option<&Path>,
) -> Result<ActionDecision> {
    let config = load_config(config)?;
    let intrinsic: ErrorSet = intrinsic.iter().map(String::as_str).collect();
    let cad: ErrorSet = cad.iter().map(String::as_str).collect();
    let risk = RiskLevel::from(risk);

    if let RiskLevel::Unrecognized(label) = &risk {
        warn!(label = %label, "Unrecognized risk level, treating as LOW");
    }

    Ok(map_actions_with_policy(
        &intrinsic,
        &cad,
        score,
        &risk,
        &config.policy,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_advisor::Action;
    use tempfile::TempDir;

    const SIGNALS: &str = r#"[
        { "element_id": 1, "anomaly_score": 0.0, "risk_level": "LOW" },
        { "element_id": 2, "anomaly_score": 0.05, "risk_level": "MEDIUM",
          "intrinsic_errors": ["BAD_TRANSITION"], "cad_errors": ["CAD_DEVIATION_HIGH"] },
        { "element_id": 3, "anomaly_score": 0.3, "intrinsic_errors": ["HIGH_SKEWNESS"] }
    ]"#;

    const BEFORE: &str = r#"[
        { "element_id": 1, "centroid": [0.0, 0.0, 0.0], "quality": 1.0 },
        { "element_id": 2, "centroid": [1.0, 0.0, 0.0], "quality": 3.0 },
        { "element_id": 3, "centroid": [2.0, 0.0, 0.0], "quality": 9.0 }
    ]"#;

    const AFTER: &str = r#"[
        { "element_id": 1, "centroid": [0.0, 0.0, 0.0], "quality": 1.0 },
        { "element_id": 2, "centroid": [1.0, 0.5, 0.0], "quality": 2.0 }
    ]"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Runs `recommend` and returns the JSON path for `validate`.
    fn recommend_into(dir: &TempDir, signals: &str) -> PathBuf {
        let signals = write(dir, "signals.json", signals);
        let json = dir.path().join("recs.json");
        recommend(&signals, &dir.path().join("recs.csv"), Some(&json), None).unwrap();
        json
    }

    #[test]
    fn recommend_writes_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let signals = write(&dir, "signals.json", SIGNALS);
        let csv = dir.path().join("recs.csv");
        let json = dir.path().join("recs.json");

        let report = recommend(&signals, &csv, Some(&json), None).unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.get(3).unwrap().primary_action, Action::DeleteAndRemesh);

        let text = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(json.exists());
    }

    #[test]
    fn recommend_reports_missing_signals() {
        let dir = tempfile::tempdir().unwrap();
        let err = recommend(
            &dir.path().join("absent.json"),
            &dir.path().join("recs.csv"),
            None,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to load signals"));
    }

    #[test]
    fn validate_measures_actionable_rows() {
        let dir = tempfile::tempdir().unwrap();
        let recs = recommend_into(&dir, SIGNALS);
        let before = write(&dir, "before.json", BEFORE);
        let after = write(&dir, "after.json", AFTER);

        let metrics = validate(&recs, &before, &after, None).unwrap().unwrap();
        assert_eq!(metrics.actionable_count, 2);
        assert_eq!(metrics.removed_count, 1);
        assert!((metrics.change_hit_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_negative_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");

        let err = validate(&missing, &missing, &missing, Some(-1.0)).unwrap_err();
        assert!(err.to_string().contains("move tolerance"));
    }

    #[test]
    fn validate_without_actionable_rows_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let recs = recommend_into(
            &dir,
            r#"[{ "element_id": 1, "anomaly_score": 0.0, "risk_level": "LOW" }]"#,
        );
        let before = write(&dir, "before.json", BEFORE);
        let after = write(&dir, "after.json", AFTER);

        assert!(validate(&recs, &before, &after, Some(0.0)).unwrap().is_none());
    }

    #[test]
    fn map_decides_single_element() {
        let decision = map(
            "MEDIUM",
            0.065,
            &["SMALL_AREA".to_string()],
            &["CAD_DEVIATION_HIGH".to_string()],
            None,
        )
        .unwrap();
        assert_eq!(decision.actions, [Action::RefineLocally, Action::MoveNodesToCad]);
        assert_eq!(decision.confidence.to_bits(), f64::to_bits(0.61));
    }

    #[test]
    fn map_treats_unknown_tier_as_low() {
        let decision = map("critical", 0.9, &[], &[], None).unwrap();
        assert_eq!(decision.primary_action, Action::NoAction);
    }

    #[test]
    fn map_reports_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(&dir, "config.json", "{ not json");
        let err = map("HIGH", 0.0, &[], &[], Some(&config)).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}
