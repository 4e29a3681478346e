use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// One isolated monitoring setup: a monitored root plus baseline and report
/// locations that live beside it, never inside it.
pub struct Fixture {
    // Held so the directory outlives the test.
    #[allow(dead_code)]
    temp: TempDir,
    pub root: PathBuf,
    pub baseline_file: PathBuf,
    pub report_dir: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("watched");
        fs::create_dir(&root).unwrap();

        Fixture {
            baseline_file: temp.path().join("fim-baseline.toml"),
            report_dir: temp.path().join("fim-incidents"),
            temp,
            root,
        }
    }

    pub fn baseline_cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("fimsentry");
        cmd.arg("baseline")
            .arg(&self.root)
            .arg("--baseline-file")
            .arg(&self.baseline_file);
        cmd
    }

    // Each integration test file is compiled as its own crate; the
    // baseline-focused crate never runs a check, so this helper is
    // intentionally unused there.
    #[allow(dead_code)]
    pub fn check_cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("fimsentry");
        cmd.arg("check")
            .arg(&self.root)
            .arg("--baseline-file")
            .arg(&self.baseline_file)
            .arg("--report-dir")
            .arg(&self.report_dir);
        cmd
    }

    /// The report files written so far, in filename (chronological) order.
    #[allow(dead_code)]
    pub fn report_paths(&self) -> Vec<PathBuf> {
        if !self.report_dir.exists() {
            return Vec::new();
        }
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.report_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        paths.sort();
        paths
    }

    /// Parses the single report this fixture is expected to contain.
    #[allow(dead_code)]
    pub fn single_report(&self) -> serde_json::Value {
        let paths = self.report_paths();
        assert_eq!(paths.len(), 1, "expected exactly one report: {paths:?}");
        serde_json::from_str(&fs::read_to_string(&paths[0]).unwrap()).unwrap()
    }
}
