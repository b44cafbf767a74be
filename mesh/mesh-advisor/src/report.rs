//! Loading element signals and saving recommendation tables.
//!
//! - **Signals**: JSON array of [`ElementSignals`]
//! - **Recommendations**: CSV for engineers, JSON for the validator
//! - **Snapshots**: JSON array of [`ElementSnapshot`] per mesh state

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::assembler::{ElementSignals, RecommendationReport};
use crate::error::{AdvisorError, AdvisorResult};
use crate::validation::ElementSnapshot;

/// Column header of the recommendations CSV.
pub const CSV_HEADER: &str =
    "element_id,primary_action,reasons,confidence,ai_severity,anomaly_score,error_codes";

/// Separator between reasons within one CSV cell.
pub const REASON_SEPARATOR: &str = "; ";

/// Separator between error codes within one CSV cell.
pub const CODE_SEPARATOR: &str = "|";

/// Parse element signals from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or not an array of signals.
pub fn parse_signals_json(json: &str) -> AdvisorResult<Vec<ElementSignals>> {
    Ok(serde_json::from_str(json)?)
}

/// Load element signals from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_signals_json<P: AsRef<Path>>(path: P) -> AdvisorResult<Vec<ElementSignals>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let signals: Vec<ElementSignals> = serde_json::from_reader(reader)?;

    let invalid = signals
        .iter()
        .filter(|s| !s.anomaly_score.is_finite())
        .count();
    if invalid > 0 {
        debug!(invalid, "Signals with non-finite anomaly scores");
    }

    let unrecognized = signals
        .iter()
        .flat_map(|s| s.intrinsic_errors.iter().chain(s.cad_errors.iter()))
        .filter(|c| c.is_unrecognized())
        .count();
    if unrecognized > 0 {
        debug!(unrecognized, "Error codes outside the policy vocabulary");
    }

    info!(path = %path.display(), elements = signals.len(), "Loaded element signals");
    Ok(signals)
}

/// Write the recommendations table as CSV.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_recommendations_csv<W: Write>(
    report: &RecommendationReport,
    mut writer: W,
) -> AdvisorResult<()> {
    writeln!(writer, "{CSV_HEADER}")?;

    for rec in &report.recommendations {
        let codes: Vec<&str> = rec.error_codes.iter().map(|c| c.as_str()).collect();
        writeln!(
            writer,
            "{},{},{},{:.2},{},{},{}",
            rec.element_id,
            csv_field(rec.primary_action.as_str()),
            csv_field(&rec.joined_reasons(REASON_SEPARATOR)),
            rec.confidence,
            csv_field(rec.severity.as_str()),
            rec.anomaly_score,
            csv_field(&codes.join(CODE_SEPARATOR)),
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Save the recommendations table as a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_recommendations_csv<P: AsRef<Path>>(
    report: &RecommendationReport,
    path: P,
) -> AdvisorResult<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    write_recommendations_csv(report, writer)?;
    info!(path = %path.display(), rows = report.len(), "Wrote recommendations CSV");
    Ok(())
}

/// Save recommendations as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_recommendations_json<P: AsRef<Path>>(
    report: &RecommendationReport,
    path: P,
) -> AdvisorResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    info!(path = %path.display(), rows = report.len(), "Wrote recommendations JSON");
    Ok(())
}

/// Load recommendations saved by [`save_recommendations_json`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a row's
/// primary action is not its first action.
pub fn load_recommendations_json<P: AsRef<Path>>(path: P) -> AdvisorResult<RecommendationReport> {
    let reader = BufReader::new(File::open(path)?);
    let report: RecommendationReport = serde_json::from_reader(reader)?;

    if let Some(rec) = report
        .recommendations
        .iter()
        .find(|r| r.actions.first() != Some(&r.primary_action))
    {
        return Err(AdvisorError::invalid_content(format!(
            "element {}: primary action {} is not the first action",
            rec.element_id, rec.primary_action
        )));
    }

    Ok(report)
}

/// Load a mesh-state snapshot from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_snapshots_json<P: AsRef<Path>>(path: P) -> AdvisorResult<Vec<ElementSnapshot>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Quote a CSV field if it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
