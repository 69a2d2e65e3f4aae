//! Style-sheet execution for the transform mode
//!
//! The XSLT work itself is delegated to an external processor (`xsltproc` by
//! default). Its output is then pushed through the character table so
//! BugTrack's typographic characters reach Jira as numeric references.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use jbtimporter_core::charmap::CharacterMap;
use jbtimporter_core::lifecycle::TransformError;
use log::debug;

/// Command line used when none is configured.
pub const DEFAULT_COMMAND: &str = "xsltproc --encoding UTF-8";

/// Applies a style sheet to one source document.
pub trait StyleSheetEngine {
    fn transform(&self, source: &Path, style_sheet: &Path) -> Result<Vec<u8>, TransformError>;
}

/// Runs an XSLT processor as a child process.
///
/// The configured style sheet is imported by a small generated wrapper that
/// declares `indent="yes"` and UTF-8 output, so the result is always indented
/// whatever the style sheet's own `xsl:output` says. The wrapper and the source
/// document are appended to the configured arguments, matching
/// `xsltproc [options] stylesheet file`.
#[derive(Debug, Clone)]
pub struct XsltProcess {
    program: PathBuf,
    args: Vec<String>,
}

impl XsltProcess {
    /// Split `command_line` with shell quoting rules and locate the program.
    pub fn from_command_line(command_line: &str) -> Result<Self, TransformError> {
        let mut words = shlex::split(command_line)
            .ok_or_else(|| TransformError::Engine(format!("unbalanced quotes in `{command_line}`")))?
            .into_iter();

        let program = words
            .next()
            .ok_or_else(|| TransformError::Engine("empty XSLT command".to_string()))?;
        let program = which::which(&program)
            .map_err(|e| TransformError::Engine(format!("cannot find `{program}`: {e}")))?;

        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl StyleSheetEngine for XsltProcess {
    fn transform(&self, source: &Path, style_sheet: &Path) -> Result<Vec<u8>, TransformError> {
        let style_sheet = std::fs::canonicalize(style_sheet).map_err(|e| {
            TransformError::Engine(format!("cannot read {}: {e}", style_sheet.display()))
        })?;

        // Dropped at the end of the call, removing the wrapper.
        let mut wrapper = tempfile::Builder::new()
            .prefix(".jbt-")
            .suffix(".xsl")
            .tempfile()
            .map_err(|e| TransformError::Engine(format!("cannot create style sheet wrapper: {e}")))?;
        wrapper
            .write_all(indenting_wrapper(&style_sheet).as_bytes())
            .map_err(|e| TransformError::Engine(format!("cannot write style sheet wrapper: {e}")))?;

        debug!(
            "Running {} {:?} {} (importing {}) {}",
            self.program.display(),
            self.args,
            wrapper.path().display(),
            style_sheet.display(),
            source.display()
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(wrapper.path())
            .arg(source)
            .output()
            .map_err(|e| {
                TransformError::Engine(format!("failed to run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransformError::Engine(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Style sheet importing `style_sheet` with indented UTF-8 output forced on.
///
/// Output settings of an importing style sheet take precedence over the
/// imported one, so only `indent` and `encoding` are overridden.
pub fn indenting_wrapper(style_sheet: &Path) -> String {
    let href = style_sheet
        .to_string_lossy()
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:import href="{href}"/>
  <xsl:output indent="yes" encoding="UTF-8"/>
</xsl:stylesheet>
"#
    )
}

/// A style sheet bound to an engine and the character table.
pub struct TransformStage<E> {
    engine: E,
    character_map: CharacterMap,
    style_sheet: PathBuf,
}

impl<E: StyleSheetEngine> TransformStage<E> {
    pub fn new(engine: E, character_map: CharacterMap, style_sheet: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            character_map,
            style_sheet: style_sheet.into(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn style_sheet(&self) -> &Path {
        &self.style_sheet
    }

    /// Transform `source` and encode the result for Jira.
    pub fn transform(&self, source: &Path) -> Result<Vec<u8>, TransformError> {
        let output = self.engine.transform(source, &self.style_sheet)?;
        Ok(self.character_map.encode_bytes(output)?)
    }
}
