//! Classification of import results and run summaries

use serde::Serialize;

use crate::jelly::{ScriptOutcome, ScriptOutcomeKind};

/// Output up to this many characters from an executed script counts as success.
///
/// Jira echoes a short acknowledgement for a clean import; anything longer is a
/// diagnostic.
pub const SUCCESS_BODY_MAX_CHARS: usize = 30;

/// Printed by Jira when an attachment referenced by the script is unreadable.
pub const FILE_ATTACHMENT_MARKER: &str = "Unable to make temporary copy of file";

/// Printed by Jira when the script asks for a transition the workflow lacks.
pub const WORKFLOW_TRANSITION_MARKER: &str = "that is not a valid workflow transition for the";

/// Result of importing one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Success { id: String },
    FileAttachmentError { id: String, diagnostic: String },
    WorkflowTransitionError { id: String, diagnostic: String },
    OtherError { id: String, diagnostic: String },
}

impl ImportOutcome {
    pub fn id(&self) -> &str {
        match self {
            ImportOutcome::Success { id }
            | ImportOutcome::FileAttachmentError { id, .. }
            | ImportOutcome::WorkflowTransitionError { id, .. }
            | ImportOutcome::OtherError { id, .. } => id,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ImportOutcome::Success { .. } => None,
            ImportOutcome::FileAttachmentError { diagnostic, .. }
            | ImportOutcome::WorkflowTransitionError { diagnostic, .. }
            | ImportOutcome::OtherError { diagnostic, .. } => Some(diagnostic),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Success { .. })
    }
}

/// Decide what a submission result means for the issue.
///
/// A script exception is always an error. Otherwise the extracted text decides:
/// empty or short text is success, longer text is a diagnostic.
pub fn classify_outcome(id: &str, outcome: &ScriptOutcome) -> ImportOutcome {
    let is_error = match outcome.kind {
        ScriptOutcomeKind::ScriptException => true,
        ScriptOutcomeKind::Executed | ScriptOutcomeKind::NoMarker => {
            outcome.body.chars().count() > SUCCESS_BODY_MAX_CHARS
        }
    };

    if is_error {
        classify_diagnostic(id, outcome.body.clone())
    } else {
        ImportOutcome::Success { id: id.to_string() }
    }
}

/// Bucket an error message by the Jira diagnostics it contains.
///
/// The attachment marker is checked before the transition marker.
pub fn classify_diagnostic(id: &str, diagnostic: impl Into<String>) -> ImportOutcome {
    let id = id.to_string();
    let diagnostic = diagnostic.into();

    if diagnostic.contains(FILE_ATTACHMENT_MARKER) {
        ImportOutcome::FileAttachmentError { id, diagnostic }
    } else if diagnostic.contains(WORKFLOW_TRANSITION_MARKER) {
        ImportOutcome::WorkflowTransitionError { id, diagnostic }
    } else {
        ImportOutcome::OtherError { id, diagnostic }
    }
}

/// An issue that did not go through cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueFailure {
    pub id: String,
    pub message: String,
}

/// Buckets of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub succeeded: Vec<String>,
    pub file_attachment_errors: Vec<IssueFailure>,
    pub workflow_transition_errors: Vec<IssueFailure>,
    pub other_errors: Vec<IssueFailure>,
}

impl ImportSummary {
    pub fn record(&mut self, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Success { id } => self.succeeded.push(id),
            ImportOutcome::FileAttachmentError { id, diagnostic } => {
                self.file_attachment_errors.push(IssueFailure {
                    id,
                    message: diagnostic,
                })
            }
            ImportOutcome::WorkflowTransitionError { id, diagnostic } => {
                self.workflow_transition_errors.push(IssueFailure {
                    id,
                    message: diagnostic,
                })
            }
            ImportOutcome::OtherError { id, diagnostic } => self.other_errors.push(IssueFailure {
                id,
                message: diagnostic,
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed()
    }

    pub fn failed(&self) -> usize {
        self.file_attachment_errors.len()
            + self.workflow_transition_errors.len()
            + self.other_errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

/// Result of a transform or revert run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Issues whose payload was rewritten or restored.
    pub changed: Vec<String>,
    /// Issues left alone, e.g. reverted without a backup.
    pub unchanged: Vec<String>,
    pub failed: Vec<IssueFailure>,
}

impl BatchSummary {
    pub fn record_changed(&mut self, id: &str) {
        self.changed.push(id.to_string());
    }

    pub fn record_unchanged(&mut self, id: &str) {
        self.unchanged.push(id.to_string());
    }

    pub fn record_failure(&mut self, id: &str, message: impl Into<String>) {
        self.failed.push(IssueFailure {
            id: id.to_string(),
            message: message.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.changed.len() + self.unchanged.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
