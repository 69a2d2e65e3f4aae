//! Issue descriptors discovered in a BugTrack export

use std::path::PathBuf;

use serde::Serialize;

/// One exported issue and the location of its primary XML payload.
///
/// Descriptors are built once while parsing the manifest and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueDescriptor {
    /// Opaque BugTrack identifier, not validated.
    pub id: String,
    /// Sub-directory of the export root holding the issue's files.
    pub relative_base: String,
    /// Name of the primary payload file inside `relative_base`.
    pub primary_file_name: String,
    export_root: String,
}

impl IssueDescriptor {
    pub fn new(
        export_root: &str,
        id: impl Into<String>,
        relative_base: impl Into<String>,
        primary_file_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            relative_base: relative_base.into(),
            primary_file_name: primary_file_name.into(),
            export_root: normalize_export_root(export_root),
        }
    }

    /// The export root this descriptor was read from, always ending with `/`.
    pub fn export_root(&self) -> &str {
        &self.export_root
    }

    /// Full path of the primary file as a string.
    ///
    /// Backslashes in the root and base are normalized to forward slashes, the
    /// file name is appended verbatim.
    pub fn full_path_string(&self) -> String {
        let directory = format!("{}{}", self.export_root, self.relative_base).replace('\\', "/");
        format!("{directory}/{}", self.primary_file_name)
    }

    pub fn full_path(&self) -> PathBuf {
        PathBuf::from(self.full_path_string())
    }
}

/// Append a trailing `/` to the export root unless it already has one.
pub fn normalize_export_root(root: &str) -> String {
    if root.is_empty() || root.ends_with('/') {
        root.to_string()
    } else {
        format!("{root}/")
    }
}
