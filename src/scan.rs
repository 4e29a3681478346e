use crate::fingerprint::{Snapshot, fingerprint_file};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Monitored root does not exist: {0}")]
    RootNotFound(PathBuf),
    #[error("Monitored root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

/// Builds a snapshot of every regular file under `root`.
///
/// Recursively walks `root`, fingerprinting each regular file and keying it
/// by its root-relative path with `/` separators on every platform.
/// Directories are descended into; symlinks and special files are skipped
/// without being followed.
///
/// A missing or non-directory root is a precondition failure and is reported
/// distinctly from an empty-but-valid directory, which yields an empty
/// snapshot. Below the root, an unreadable directory is logged and skipped
/// rather than aborting the scan; an unreadable file is recorded with a
/// sentinel fingerprint so the diff still sees it.
///
/// The scan never creates, modifies, or deletes anything under `root`.
pub fn scan_tree(root: &Path) -> Result<Snapshot, ScanError> {
    let metadata = std::fs::metadata(root).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScanError::RootNotFound(root.to_path_buf()),
        ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_path_buf()),
        _ => ScanError::Io(e),
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut snapshot = Snapshot::new();
    walk_tree(root, "", &mut snapshot)?;

    Ok(snapshot)
}

fn walk_tree(dir: &Path, prefix: &str, snapshot: &mut Snapshot) -> Result<(), ScanError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| {
        if e.kind() == ErrorKind::PermissionDenied {
            ScanError::PermissionDenied(dir.to_path_buf())
        } else {
            ScanError::Io(e)
        }
    })?;

    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Entries read before the failure stay in the snapshot.
                warn!(
                    "Directory {} was only partially scanned: {}",
                    dir.display(),
                    e
                );
                break;
            }
        };
        let path = entry.path();
        let key = entry_key(prefix, &entry.file_name());

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                // Listed but unclassifiable: record it as unverifiable rather
                // than pretending it is not there.
                warn!("Failed to stat {}: {}", path.display(), e);
                snapshot.insert(key, crate::fingerprint::Fingerprint::ReadError);
                continue;
            }
        };

        if file_type.is_symlink() {
            debug!("Skipping symlink {}", path.display());
        } else if file_type.is_dir() {
            if let Err(e) = walk_tree(&path, &key, snapshot) {
                warn!("Skipping unreadable directory {}: {}", path.display(), e);
            }
        } else if file_type.is_file() {
            let fingerprint = fingerprint_file(&path);
            if snapshot.insert(key.clone(), fingerprint).is_some() {
                // Two distinct byte names can collapse onto one key after
                // lossy conversion; the last one scanned wins.
                warn!("Snapshot key {key:?} recorded twice; keeping the last entry");
            }
        } else {
            debug!("Skipping special file {}", path.display());
        }
    }

    Ok(())
}

/// Joins a directory prefix and an entry name into a posix-style snapshot
/// key. Non-UTF8 names are recorded lossily with a warning; losing the exact
/// bytes beats losing the file.
fn entry_key(prefix: &str, name: &std::ffi::OsStr) -> String {
    let name = match name.to_str() {
        Some(utf8) => utf8.to_string(),
        None => {
            warn!(
                "File name {:?} is not valid UTF-8; recording it lossily",
                name
            );
            name.to_string_lossy().into_owned()
        }
    };

    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}
