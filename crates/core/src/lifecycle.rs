//! On-disk lifecycle of an issue's payload file
//!
//! Every payload path `P` is in one of three states:
//!
//! - **Original**: `P` holds the exported XML and `P.old` does not exist.
//! - **Transformed**: `P` holds transformed XML and `P.old` holds the untouched export.
//! - **Reverted**: `P.old` has been renamed back over `P`, which is the original state again.
//!
//! The backup is only ever produced by renaming the original file and only ever
//! consumed by [`revert`], so at most one backup exists per payload and the
//! exported content is never lost. New content is staged in a temporary file in
//! the same directory and renamed into place once it is complete.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Extension appended to the payload path to form the backup path.
pub const BACKUP_EXTENSION: &str = ".old";

/// Error returned by a transformation callback.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("style-sheet engine failed: {0}")]
    Engine(String),

    #[error("transformed output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Errors raised while moving a payload between states.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("no payload file at {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl LifecycleError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| LifecycleError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Observable state of a payload path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Original,
    Transformed,
    Missing,
}

/// What [`apply_transform`] did with the backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformApplied {
    /// The live file was moved to the backup path by this call.
    BackupCreated,
    /// A backup already existed and was used as the source.
    BackupReused,
}

/// Result of [`revert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    Restored,
    NoBackup,
}

/// `P.old` for payload path `P`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut backup = OsString::from(path.as_os_str());
    backup.push(BACKUP_EXTENSION);
    PathBuf::from(backup)
}

pub fn file_state(path: &Path) -> FileState {
    if backup_path(path).exists() {
        FileState::Transformed
    } else if path.exists() {
        FileState::Original
    } else {
        FileState::Missing
    }
}

/// Transform the payload at `path` in place, keeping the original as `P.old`.
///
/// The callback receives the authoritative source: the backup when one exists,
/// otherwise the live file. Re-applying a transformation therefore always starts
/// from the exported content. If the callback fails nothing on disk changes.
pub fn apply_transform<F>(path: &Path, transform: F) -> Result<TransformApplied, LifecycleError>
where
    F: FnOnce(&Path) -> Result<Vec<u8>, TransformError>,
{
    let backup = backup_path(path);
    let had_backup = backup.exists();
    let source = if had_backup { backup.as_path() } else { path };

    let metadata = fs::metadata(source).map_err(|source_err| match source_err.kind() {
        io::ErrorKind::NotFound => LifecycleError::Missing {
            path: path.to_path_buf(),
        },
        _ => LifecycleError::Io {
            action: "inspect",
            path: source.to_path_buf(),
            source: source_err,
        },
    })?;

    let transformed = transform(source)?;

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropping `staged` on any early return removes the temporary file.
    let mut staged = tempfile::Builder::new()
        .prefix(".jbt-")
        .suffix(".tmp")
        .tempfile_in(directory)
        .map_err(LifecycleError::io("create a temporary file in", directory))?;
    staged
        .write_all(&transformed)
        .map_err(LifecycleError::io("write", staged.path()))?;
    staged
        .as_file()
        .sync_all()
        .map_err(LifecycleError::io("sync", staged.path()))?;
    fs::set_permissions(staged.path(), metadata.permissions())
        .map_err(LifecycleError::io("set permissions on", staged.path()))?;

    if had_backup {
        staged
            .persist(path)
            .map_err(|err| LifecycleError::io("replace", path)(err.error))?;
        return Ok(TransformApplied::BackupReused);
    }

    fs::rename(path, &backup).map_err(LifecycleError::io("back up", path))?;

    if let Err(err) = staged.persist(path) {
        // The original is still intact under the backup name; put it back live.
        fs::rename(&backup, path).map_err(LifecycleError::io("restore", &backup))?;
        return Err(LifecycleError::io("replace", path)(err.error));
    }

    Ok(TransformApplied::BackupCreated)
}

/// Restore the original payload from `P.old`, consuming the backup.
///
/// Without a backup this is a no-op.
pub fn revert(path: &Path) -> Result<RevertOutcome, LifecycleError> {
    let backup = backup_path(path);
    if !backup.exists() {
        return Ok(RevertOutcome::NoBackup);
    }

    fs::rename(&backup, path).map_err(LifecycleError::io("restore", &backup))?;
    Ok(RevertOutcome::Restored)
}
