//! Scanning of Jira Jelly runner pages
//!
//! Jira has no import API for BugTrack data; the importer drives the admin
//! Jelly runner page instead. Both the security token and the script result
//! therefore have to be dug out of the rendered HTML by looking for fixed
//! markers at fixed offsets. All of that knowledge lives in this module so it
//! can be checked against recorded pages.

use serde::Serialize;

/// Page that renders the Jelly runner form, including the `atl_token` field.
pub const TOKEN_PATH: &str = "secure/admin/util/JellyRunner!default.jspa";

/// Page that executes a posted Jelly script.
pub const RUNNER_PATH: &str = "secure/admin/util/JellyRunner.jspa";

pub const USERNAME_FIELD: &str = "os_username";
pub const PASSWORD_FIELD: &str = "os_password";
pub const TOKEN_FIELD: &str = "atl_token";
pub const FILE_FIELD: &str = "file";
pub const SCRIPT_FIELD: &str = "script";

const TOKEN_MARKER: &str = "name=\"atl_token\"";

const JELLY_NAMESPACE_SINGLE: &str = "xmlns:j='jelly:core'";
const JELLY_NAMESPACE_DOUBLE: &str = "xmlns:j=\"jelly:core\"";
const JELLY_NAMESPACE_ESCAPED: &str = "xmlns:j=&quot;jelly:core&quot;";
const JELLY_END: &str = "/JiraJelly";
/// Length of the escaped `&gt;` / `&lt;` around the echoed script.
const ESCAPED_BRACKET_LEN: usize = 4;

const SCRIPT_EXCEPTION_MARKER: &str = "id=\"scriptException\"";
/// Distance from the start of the exception marker to the message text.
pub const SCRIPT_EXCEPTION_OFFSET: usize = 203;
const SCRIPT_EXCEPTION_END: &str = "/div";

/// Replacements applied, in order, to extracted text.
const HTML_REPLACEMENTS: &[(&str, &str)] = &[
    ("<BR>", "\n"),
    ("<b>", ""),
    ("</b>", ""),
    ("&nbsp;", " "),
    ("&gt;", ">"),
    ("&lt;", "<"),
    ("&quot;", "\""),
    (".<br/>", ""),
    (".<BR/>", ""),
    (".<br>", ""),
    (".<BR>", ""),
];

/// Credential required on every script submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityToken(String);

impl SecurityToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty token means the login or the page scrape failed.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Which marker the submission page carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOutcomeKind {
    /// The script ran; the body is whatever it printed.
    Executed,
    /// Jira could not run the script at all.
    ScriptException,
    /// No known marker was found.
    NoMarker,
}

/// Decoded result of one script submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptOutcome {
    pub kind: ScriptOutcomeKind,
    pub body: String,
}

impl ScriptOutcome {
    pub fn new(kind: ScriptOutcomeKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }
}

/// The page carried a marker but not the text that should follow it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("response ends before the text following `{marker}`")]
    Truncated { marker: &'static str },

    #[error("no `{terminator}` after `{marker}`")]
    Unterminated {
        marker: &'static str,
        terminator: &'static str,
    },
}

/// Pull the `atl_token` value out of the Jelly runner form page.
///
/// Returns an empty token when the hidden field is not on the page, which is
/// what Jira renders for a failed login.
pub fn extract_token(html: &str) -> SecurityToken {
    let Some(position) = html.find(TOKEN_MARKER) else {
        return SecurityToken::default();
    };
    let rest = &html[position + TOKEN_MARKER.len()..];

    let value = rest.find('"').and_then(|open| {
        let value = &rest[open + 1..];
        value.find('"').map(|close| &value[..close])
    });

    SecurityToken::new(value.unwrap_or_default())
}

/// Decode the page returned by a script submission.
///
/// The markers are checked independently in a fixed order (namespace, escaped
/// namespace, script exception) and the last one found determines the result.
/// A marker that cannot be sliced only fails the page when no later marker
/// replaces it.
pub fn parse_submission_response(html: &str) -> Result<ScriptOutcome, ResponseError> {
    let mut outcome = Ok(ScriptOutcome::new(ScriptOutcomeKind::NoMarker, ""));

    let namespace = html
        .find(JELLY_NAMESPACE_SINGLE)
        .map(|position| (position, JELLY_NAMESPACE_SINGLE))
        .or_else(|| {
            html.find(JELLY_NAMESPACE_DOUBLE)
                .map(|position| (position, JELLY_NAMESPACE_DOUBLE))
        });
    if let Some((position, marker)) = namespace {
        outcome = slice_until(
            html,
            position + marker.len() + ESCAPED_BRACKET_LEN,
            marker,
            JELLY_END,
            ESCAPED_BRACKET_LEN,
        )
        .map(|body| ScriptOutcome::new(ScriptOutcomeKind::Executed, reformat_html(body)));
    }

    if let Some(position) = html.find(JELLY_NAMESPACE_ESCAPED) {
        outcome = slice_until(
            html,
            position + JELLY_NAMESPACE_ESCAPED.len() + ESCAPED_BRACKET_LEN,
            JELLY_NAMESPACE_ESCAPED,
            JELLY_END,
            ESCAPED_BRACKET_LEN,
        )
        .map(|body| ScriptOutcome::new(ScriptOutcomeKind::Executed, reformat_html(body)));
    }

    if let Some(position) = html.find(SCRIPT_EXCEPTION_MARKER) {
        outcome = slice_until(
            html,
            position + SCRIPT_EXCEPTION_OFFSET,
            SCRIPT_EXCEPTION_MARKER,
            SCRIPT_EXCEPTION_END,
            1,
        )
        .map(|body| {
            ScriptOutcome::new(ScriptOutcomeKind::ScriptException, reformat_html(body))
        });
    }

    outcome
}

/// Turn the HTML fragments Jira wraps around messages back into plain text.
pub fn reformat_html(input: &str) -> String {
    HTML_REPLACEMENTS
        .iter()
        .fold(input.to_string(), |text, (from, to)| text.replace(from, to))
}

/// Text from byte `start` up to `trim` bytes before the next `terminator`.
fn slice_until<'a>(
    html: &'a str,
    start: usize,
    marker: &'static str,
    terminator: &'static str,
    trim: usize,
) -> Result<&'a str, ResponseError> {
    if start > html.len() {
        return Err(ResponseError::Truncated { marker });
    }
    let rest = &html[ceil_char_boundary(html, start)..];

    let end = rest
        .find(terminator)
        .and_then(|end| end.checked_sub(trim))
        .ok_or(ResponseError::Unterminated { marker, terminator })?;

    Ok(&rest[..floor_char_boundary(rest, end)])
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
