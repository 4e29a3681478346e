use crate::baseline::{BaselineError, BaselineFile, BaselineLoad, load_baseline};
use crate::config::MonitorConfig;
use crate::diff::{IncidentBatch, reconcile};
use crate::report::{ReportError, write_report};
use crate::scan::{ScanError, scan_tree};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Baseline(#[from] BaselineError),
}

/// What a check run found.
///
/// The first two variants are recoveries, not results: no diff was performed,
/// which is not the same as a diff that found nothing.
#[derive(Debug)]
pub enum CheckOutcome {
    /// No baseline exists yet; there is nothing to compare against.
    NoBaseline,
    /// A baseline exists but could not be parsed; the compare was skipped.
    BaselineCorrupted(BaselineError),
    /// Every fingerprint matched the baseline.
    Clean { files_checked: usize },
    /// At least one integrity breach was detected. `report` carries the
    /// written report path, or the write failure; either way the in-memory
    /// classification stands.
    Breaches {
        batch: IncidentBatch,
        report: Result<PathBuf, ReportError>,
    },
}

/// Scans the monitored tree and persists the result as the new baseline,
/// wholesale replacing any previous one. Returns the number of files
/// recorded. A missing root fails before anything is written.
pub fn create_baseline(config: &MonitorConfig) -> Result<usize, MonitorError> {
    let snapshot = scan_tree(&config.root)?;
    let count = snapshot.len();

    BaselineFile::new(snapshot).save(&config.baseline_path)?;

    info!(
        "Baseline of {} files written to {}",
        count,
        config.baseline_path.display()
    );

    Ok(count)
}

/// Runs one check cycle: scan, load baseline, reconcile, report.
///
/// The scan runs first so a missing root is fatal regardless of baseline
/// state. Absent and corrupted baselines are recovered into their own
/// outcomes; a report write failure is carried inside `Breaches` so the
/// caller can still print the classification.
pub fn run_check(config: &MonitorConfig) -> Result<CheckOutcome, MonitorError> {
    let current = scan_tree(&config.root)?;

    let baseline = match load_baseline(&config.baseline_path)? {
        BaselineLoad::Present(baseline) => baseline,
        BaselineLoad::Absent => {
            warn!(
                "No baseline at {}; run `fimsentry baseline` first",
                config.baseline_path.display()
            );
            return Ok(CheckOutcome::NoBaseline);
        }
        BaselineLoad::Corrupted(cause) => {
            error!(
                "Baseline at {} is corrupted, compare skipped: {}",
                config.baseline_path.display(),
                cause
            );
            error!("Re-establish it with `fimsentry baseline` once the tree is trusted");
            return Ok(CheckOutcome::BaselineCorrupted(cause));
        }
    };

    let batch = reconcile(&baseline.files, &current);

    if batch.is_empty() {
        info!("Integrity check passed: {} files verified", current.len());
        return Ok(CheckOutcome::Clean {
            files_checked: current.len(),
        });
    }

    let report = write_report(&config.report_dir, &config.label, &batch);
    if let Err(e) = &report {
        error!("Failed to write incident report: {e}");
    }

    Ok(CheckOutcome::Breaches { batch, report })
}
