use crate::fingerprint::Snapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Unsupported baseline version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Meta {
    version: u32,
}

/// Helper struct to extract only the meta section from a TOML file,
/// ignoring all other content. Used to check version before parsing the full
/// file. Note: We explicitly do NOT use deny_unknown_fields here, as this
/// struct's purpose is to ignore everything except meta.
#[derive(Debug, Deserialize)]
struct MetaOnly {
    meta: Meta,
}

/// On-disk baseline: a versioned `[meta]` header plus a `[files]` table
/// mapping root-relative paths to fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineFile {
    meta: Meta,
    pub files: Snapshot,
}

/// Outcome of attempting to load a baseline for a check run.
///
/// A missing baseline and a damaged baseline are different situations and
/// callers must be able to act on each: `Absent` means no reference state
/// exists yet, `Corrupted` means one exists but cannot be trusted. Only hard
/// I/O failures (e.g. permission denied) surface as `Err`.
#[derive(Debug)]
pub enum BaselineLoad {
    Present(BaselineFile),
    Absent,
    Corrupted(BaselineError),
}

impl BaselineFile {
    const SUPPORTED_VERSION: u32 = 1;

    /// Create a new BaselineFile with the current supported version
    pub fn new(files: Snapshot) -> Self {
        BaselineFile {
            meta: Meta {
                version: Self::SUPPORTED_VERSION,
            },
            files,
        }
    }

    /// Parse a TOML string into a BaselineFile structure
    pub fn from_toml(content: &str) -> Result<Self, BaselineError> {
        // First, extract only the meta section to check version. Otherwise
        // we would fail on unexpected *other* input (which could just be
        // due to a future version), without being able to provide a sensible
        // explanation.
        let meta_only: MetaOnly = toml::from_str(content)?;

        if meta_only.meta.version != Self::SUPPORTED_VERSION {
            return Err(BaselineError::UnsupportedVersion(meta_only.meta.version));
        }

        // Version is supported, now parse the full file
        let baseline: BaselineFile = toml::from_str(content)?;
        Ok(baseline)
    }

    /// Serialize a BaselineFile structure to TOML string
    pub fn to_toml(&self) -> Result<String, BaselineError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a BaselineFile from the filesystem
    pub fn load(path: &Path) -> Result<Self, BaselineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                BaselineError::PermissionDenied(path.to_path_buf())
            } else {
                BaselineError::Io(e)
            }
        })?;

        Self::from_toml(&content)
    }

    /// Save a BaselineFile to the filesystem atomically.
    ///
    /// Writes to a temporary file, fsyncs it, then atomically renames it into
    /// place. A reader never observes a half-written baseline.
    pub fn save(&self, path: &Path) -> Result<(), BaselineError> {
        use std::io::Write;

        let content = self.to_toml()?;

        // A bare relative filename has an empty parent; the temp file then
        // belongs in the working directory.
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                BaselineError::PermissionDenied(parent.to_path_buf())
            } else {
                BaselineError::Io(e)
            }
        })?;

        temp_file.write_all(content.as_bytes()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                BaselineError::PermissionDenied(path.to_path_buf())
            } else {
                BaselineError::Io(e)
            }
        })?;

        temp_file.as_file().sync_all().map_err(BaselineError::Io)?;

        temp_file.persist(path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::PermissionDenied {
                BaselineError::PermissionDenied(path.to_path_buf())
            } else {
                BaselineError::Io(e.error)
            }
        })?;

        Ok(())
    }
}

/// Load the baseline at `path`, classifying the result.
///
/// NotFound becomes `Absent`; syntax, structure, fingerprint, and version
/// problems become `Corrupted` carrying the underlying diagnostic; everything
/// else is a real error.
pub fn load_baseline(path: &Path) -> Result<BaselineLoad, BaselineError> {
    match BaselineFile::load(path) {
        Ok(baseline) => Ok(BaselineLoad::Present(baseline)),
        Err(BaselineError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(BaselineLoad::Absent)
        }
        Err(e @ (BaselineError::TomlParse(_) | BaselineError::UnsupportedVersion(_))) => {
            Ok(BaselineLoad::Corrupted(e))
        }
        Err(e) => Err(e),
    }
}
