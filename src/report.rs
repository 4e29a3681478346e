use crate::diff::IncidentBatch;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One forensic report document: a timestamped, immutable wrapper around a
/// single check run's incident batch.
#[derive(Debug, Serialize)]
struct Report<'a> {
    report_id: String,
    timestamp_utc: DateTime<Utc>,
    agent: &'a str,
    total_breaches: usize,
    breach_details: &'a IncidentBatch,
}

/// Filename-safe stamp whose lexicographic order matches chronological
/// order. Millisecond precision keeps back-to-back check runs from landing
/// on the same filename.
fn report_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// Persists an incident batch as `incident_<stamp>.json` under `report_dir`.
///
/// Creates the report directory if needed. Existing reports are never
/// touched; each call produces a new document. An empty batch still yields a
/// valid zero-count report, though callers only invoke this for breaches.
pub fn write_report(
    report_dir: &Path,
    agent: &str,
    batch: &IncidentBatch,
) -> Result<PathBuf, ReportError> {
    write_report_at(report_dir, agent, batch, Utc::now())
}

fn write_report_at(
    report_dir: &Path,
    agent: &str,
    batch: &IncidentBatch,
    now: DateTime<Utc>,
) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(report_dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            ReportError::PermissionDenied(report_dir.to_path_buf())
        } else {
            ReportError::Io(e)
        }
    })?;

    let stamp = report_stamp(now);
    let report = Report {
        report_id: format!("INCIDENT-{stamp}"),
        timestamp_utc: now,
        agent,
        total_breaches: batch.total(),
        breach_details: batch,
    };

    let path = report_dir.join(format!("incident_{stamp}.json"));
    let json = serde_json::to_string_pretty(&report)?;

    std::fs::write(&path, json).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            ReportError::PermissionDenied(path.clone())
        } else {
            ReportError::Io(e)
        }
    })?;

    info!("Wrote incident report {}", path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{AddedIncident, DeletedIncident, ModifiedIncident};
    use crate::fingerprint::Fingerprint;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn hash(fill: char) -> Fingerprint {
        Fingerprint::Sha256(fill.to_string().repeat(64))
    }

    fn sample_batch() -> IncidentBatch {
        IncidentBatch {
            modified: vec![ModifiedIncident {
                path: "a.txt".to_string(),
                baseline_hash: hash('a'),
                current_hash: hash('b'),
            }],
            added: vec![AddedIncident {
                path: "b.txt".to_string(),
                current_hash: hash('c'),
            }],
            deleted: vec![DeletedIncident {
                path: "c.txt".to_string(),
                baseline_hash: hash('d'),
            }],
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, 14, 15, 2).unwrap() + chrono::Duration::milliseconds(331)
    }

    #[test]
    fn test_stamp_is_filename_safe_and_sortable() {
        let stamp = report_stamp(fixed_time());

        assert_eq!(stamp, "20260823_141502_331");

        let later = report_stamp(fixed_time() + chrono::Duration::milliseconds(1));
        assert!(later > stamp);
    }

    #[test]
    fn test_report_content() {
        let temp = TempDir::new().unwrap();
        let batch = sample_batch();

        let path = write_report_at(temp.path(), "fimsentry (test)", &batch, fixed_time()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "incident_20260823_141502_331.json"
        );

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(json["report_id"], "INCIDENT-20260823_141502_331");
        assert_eq!(json["timestamp_utc"], "2026-08-23T14:15:02.331Z");
        assert_eq!(json["agent"], "fimsentry (test)");
        assert_eq!(json["total_breaches"], 3);
        assert_eq!(json["breach_details"]["modified"][0]["file"], "a.txt");
        assert_eq!(
            json["breach_details"]["modified"][0]["baseline_hash"],
            "a".repeat(64)
        );
        assert_eq!(json["breach_details"]["added"][0]["file"], "b.txt");
        assert_eq!(json["breach_details"]["deleted"][0]["file"], "c.txt");
    }

    #[test]
    fn test_creates_report_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("reports/not/yet/there");

        let path = write_report(&nested, "agent", &sample_batch()).unwrap();

        assert!(path.exists());
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn test_reports_accumulate() {
        let temp = TempDir::new().unwrap();
        let batch = sample_batch();

        let first = write_report_at(temp.path(), "agent", &batch, fixed_time()).unwrap();
        let second = write_report_at(
            temp.path(),
            "agent",
            &batch,
            fixed_time() + chrono::Duration::milliseconds(1),
        )
        .unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert!(second.exists());
    }

    #[test]
    fn test_empty_batch_still_writes_a_valid_report() {
        let temp = TempDir::new().unwrap();

        let path = write_report(temp.path(), "agent", &IncidentBatch::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["total_breaches"], 0);
        assert!(
            json["breach_details"]["modified"]
                .as_array()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_unwritable_report_dir_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        std::fs::create_dir(&locked).unwrap();

        let mut perms = std::fs::metadata(&locked).unwrap().permissions();
        perms.set_mode(0o555);
        std::fs::set_permissions(&locked, perms.clone()).unwrap();

        let result = write_report(&locked.join("reports"), "agent", &sample_batch());

        perms.set_mode(0o755);
        std::fs::set_permissions(&locked, perms).unwrap();

        assert!(matches!(result, Err(ReportError::PermissionDenied(_))));
    }
}
