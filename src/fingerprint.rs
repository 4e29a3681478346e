use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Mapping from relative file path (posix-style, relative to the monitored
/// root) to the file's fingerprint. One entry per regular file; built fresh
/// on every scan.
pub type Snapshot = BTreeMap<String, Fingerprint>;

const UNREADABLE_SENTINEL: &str = "unreadable";
const READ_ERROR_SENTINEL: &str = "ERROR";

#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

/// Content fingerprint of a single file.
///
/// The two sentinel variants keep "could not read" distinguishable from both
/// "missing from the snapshot" and any valid digest. They serialize to the
/// fixed sentinel strings, a real digest to its 64-char lowercase hex form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    /// SHA-256 of the file's raw bytes, 64 lowercase hex chars.
    Sha256(String),
    /// The path did not resolve to a regular file at read time.
    Unreadable,
    /// Reading the file failed mid-stream (permissions, I/O error,
    /// file removed during the read).
    ReadError,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Sha256(hex) => f.write_str(hex),
            Fingerprint::Unreadable => f.write_str(UNREADABLE_SENTINEL),
            Fingerprint::ReadError => f.write_str(READ_ERROR_SENTINEL),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid fingerprint {0:?} (expected 64 lowercase hex chars, \"unreadable\" or \"ERROR\")")]
pub struct ParseFingerprintError(String);

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    /// Strict parse of the wire form. Anything that is neither a well-formed
    /// digest nor one of the defined sentinels is rejected, so a mangled
    /// baseline entry surfaces as corruption instead of a value that can
    /// never match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UNREADABLE_SENTINEL => Ok(Fingerprint::Unreadable),
            READ_ERROR_SENTINEL => Ok(Fingerprint::ReadError),
            hex if hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) => {
                Ok(Fingerprint::Sha256(hex.to_string()))
            }
            other => Err(ParseFingerprintError(other.to_string())),
        }
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Computes the SHA-256 digest of a file's byte content.
///
/// Reads in fixed-size chunks through an incremental hasher, so memory use is
/// bounded by the chunk size regardless of file size. The handle is closed on
/// every exit path before returning.
pub fn digest_file(path: &Path) -> Result<String, FingerprintError> {
    info!("Fingerprinting {}", path.display());

    let mut file = File::open(path).map_err(|e| {
        if e.kind() == ErrorKind::PermissionDenied {
            FingerprintError::PermissionDenied(path.to_path_buf())
        } else {
            FingerprintError::Io(e)
        }
    })?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| {
            if e.kind() == ErrorKind::PermissionDenied {
                FingerprintError::PermissionDenied(path.to_path_buf())
            } else {
                FingerprintError::Io(e)
            }
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let digest = format!("{:x}", hasher.finalize());

    debug!("Fingerprint of {} is {}", path.display(), digest);

    Ok(digest)
}

/// Fingerprints a single file, turning per-file failures into sentinels.
///
/// A path that is not a regular file at read time yields
/// `Fingerprint::Unreadable`; a read failure is logged and yields
/// `Fingerprint::ReadError`. Neither aborts the caller's scan, so an
/// integrity check never silently skips a file it could not verify.
pub fn fingerprint_file(path: &Path) -> Fingerprint {
    if !path.is_file() {
        return Fingerprint::Unreadable;
    }

    match digest_file(path) {
        Ok(digest) => Fingerprint::Sha256(digest),
        Err(FingerprintError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            // Removed between the type check and the open.
            Fingerprint::Unreadable
        }
        Err(e) => {
            warn!("Failed to fingerprint {}: {}", path.display(), e);
            Fingerprint::ReadError
        }
    }
}
