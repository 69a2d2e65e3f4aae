//! Parsing of the BugTrack export manifest (`index.xml`)
//!
//! The manifest lists every exported bug with the files that belong to it:
//!
//! ```xml
//! <bugs>
//!   <bug id="100" base="2010/01">
//!     <file primary="true">details.xml</file>
//!     <file>screenshot.png</file>
//!   </bug>
//! </bugs>
//! ```
//!
//! Each file element flagged `primary="true"` yields one [`IssueDescriptor`].
//! Bugs without a primary file cannot be imported and are skipped.

use std::fs;
use std::path::PathBuf;

use crate::issue::{normalize_export_root, IssueDescriptor};

/// File name of the manifest at the export root.
pub const INDEX_FILE_NAME: &str = "index.xml";

const BUG_ELEMENT: &str = "bug";
const ID_ATTRIBUTE: &str = "id";
const BASE_ATTRIBUTE: &str = "base";
const PRIMARY_ATTRIBUTE: &str = "primary";

/// Errors raised while loading the manifest. All of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
}

/// Path of the manifest for the given export root.
pub fn index_path(export_root: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}{INDEX_FILE_NAME}",
        normalize_export_root(export_root)
    ))
}

/// Read and parse `index.xml` under `export_root`.
pub fn read_index(export_root: &str) -> Result<Vec<IssueDescriptor>, ManifestError> {
    let path = index_path(export_root);
    let xml = fs::read_to_string(&path).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;

    parse_manifest(&xml, export_root).map_err(|source| ManifestError::Parse { path, source })
}

/// Parse manifest text into descriptors, in document order.
///
/// `bug` elements are collected at any depth. Every element child of a bug whose
/// `primary` attribute is exactly `"true"` contributes one descriptor named after
/// its first text node.
pub fn parse_manifest(
    xml: &str,
    export_root: &str,
) -> Result<Vec<IssueDescriptor>, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(xml, options)?;

    let issues = document
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == BUG_ELEMENT)
        .flat_map(|bug| {
            let id = bug.attribute(ID_ATTRIBUTE).unwrap_or_default();
            let base = bug.attribute(BASE_ATTRIBUTE).unwrap_or_default();

            bug.children()
                .filter(|file| {
                    file.is_element() && file.attribute(PRIMARY_ATTRIBUTE) == Some("true")
                })
                .map(move |file| {
                    let file_name = file.text().unwrap_or_default().trim();
                    IssueDescriptor::new(export_root, id, base, file_name)
                })
        })
        .collect();

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SINGLE_ISSUE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bugs>
  <bug id="100" base="2010/01">
    <file primary="true">details.xml</file>
    <file>attachment.txt</file>
  </bug>
</bugs>"#;

    #[test]
    fn test_parse_manifest_single_primary_file() {
        let issues = parse_manifest(SINGLE_ISSUE, "/exports").unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "100");
        assert_eq!(issues[0].relative_base, "2010/01");
        assert_eq!(issues[0].primary_file_name, "details.xml");
        assert_eq!(issues[0].full_path_string(), "/exports/2010/01/details.xml");
    }

    #[test]
    fn test_parse_manifest_keeps_document_order() {
        let xml = r#"<bugs>
            <bug id="3" base="a"><file primary="true">three.xml</file></bug>
            <bug id="1" base="b"><file primary="true">one.xml</file></bug>
            <bug id="2" base="c"><file primary="true">two.xml</file></bug>
        </bugs>"#;

        let ids: Vec<String> = parse_manifest(xml, "/r/")
            .unwrap()
            .into_iter()
            .map(|issue| issue.id)
            .collect();

        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_parse_manifest_skips_bugs_without_primary_file() {
        let xml = r#"<bugs>
            <bug id="1" base="a"><file>notes.txt</file></bug>
            <bug id="2" base="b"><file primary="false">x.xml</file></bug>
            <bug id="3" base="c"/>
            <bug id="4" base="d"><file primary="true">four.xml</file></bug>
        </bugs>"#;

        let issues = parse_manifest(xml, "/r/").unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "4");
    }

    #[test]
    fn test_parse_manifest_primary_flag_is_literal() {
        let xml = r#"<bugs>
            <bug id="1" base="a"><file primary="TRUE">upper.xml</file></bug>
            <bug id="2" base="b"><file primary="yes">yes.xml</file></bug>
        </bugs>"#;

        assert!(parse_manifest(xml, "/r/").unwrap().is_empty());
    }

    #[test]
    fn test_parse_manifest_one_descriptor_per_primary_file() {
        let xml = r#"<bugs>
            <bug id="9" base="z">
              <file primary="true">first.xml</file>
              <file primary="true">second.xml</file>
            </bug>
        </bugs>"#;

        let issues = parse_manifest(xml, "/r/").unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].primary_file_name, "first.xml");
        assert_eq!(issues[1].primary_file_name, "second.xml");
    }

    #[test]
    fn test_parse_manifest_nested_bugs_and_missing_attributes() {
        let xml = r#"<export><year><bugs>
            <bug><file primary="true">
                orphan.xml
            </file></bug>
        </bugs></year></export>"#;

        let issues = parse_manifest(xml, "/r/").unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "");
        assert_eq!(issues[0].relative_base, "");
        assert_eq!(issues[0].primary_file_name, "orphan.xml");
    }

    #[test]
    fn test_parse_manifest_accepts_doctype() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE bugs SYSTEM "bugtrack-index.dtd">
<bugs><bug id="5" base="b"><file primary="true">five.xml</file></bug></bugs>"#;

        assert_eq!(parse_manifest(xml, "/r/").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_manifest_rejects_malformed_xml() {
        assert!(parse_manifest("<bugs><bug id=\"1\">", "/r/").is_err());
    }

    #[test]
    fn test_read_index_from_export_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(INDEX_FILE_NAME), SINGLE_ISSUE).unwrap();

        let issues = read_index(&temp_dir.path().to_string_lossy()).unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].full_path(),
            temp_dir.path().join("2010").join("01").join("details.xml")
        );
    }

    #[test]
    fn test_read_index_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();

        let result = read_index(&temp_dir.path().to_string_lossy());

        assert!(matches!(result, Err(ManifestError::Io { .. })));
    }

    #[test]
    fn test_read_index_unparsable_manifest() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(INDEX_FILE_NAME), "not xml at all <").unwrap();

        let result = read_index(&temp_dir.path().to_string_lossy());

        assert!(matches!(result, Err(ManifestError::Parse { .. })));
    }
}
