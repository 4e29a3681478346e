use std::path::{Path, PathBuf};

/// Default baseline location, relative to the operator's working directory.
pub const DEFAULT_BASELINE_FILE: &str = "fim-baseline.toml";

/// Default directory for incident reports, relative to the operator's
/// working directory.
pub const DEFAULT_REPORT_DIR: &str = "fim-incidents";

/// All storage locations for one monitoring run, injected at startup.
///
/// There are no ambient path constants beyond the CLI defaults above; tests
/// point every field at temporary locations without touching shared state.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Root of the monitored tree.
    pub root: PathBuf,
    /// Where the baseline document lives.
    pub baseline_path: PathBuf,
    /// Where incident reports accumulate.
    pub report_dir: PathBuf,
    /// Label recorded in reports for this monitored system.
    pub label: String,
}

impl MonitorConfig {
    pub fn default_label() -> String {
        format!("fimsentry ({})", std::env::consts::OS)
    }
}

/// True when `path` would end up inside the monitored root. The monitor's
/// own state files would then show up in every diff, so callers warn about
/// this arrangement.
pub fn lies_inside_root(root: &Path, path: &Path) -> bool {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    path.starts_with(root)
}
