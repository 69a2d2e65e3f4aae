//! Run mode selection and configuration normalization

use std::path::PathBuf;

use crate::issue::normalize_export_root;

/// Jira location used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/";

/// The single operation performed by one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Submit every issue payload to Jira.
    Import,
    /// Rewrite every payload through the given style sheet.
    Transform { style_sheet: PathBuf },
    /// Restore every payload from its backup.
    Revert,
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Import => "import",
            RunMode::Transform { .. } => "transform",
            RunMode::Revert => "revert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("A valid export directory is required")]
    MissingExportDirectory,

    #[error("A valid username is required")]
    MissingUsername,

    #[error("A valid password is required")]
    MissingPassword,
}

/// Revert wins over a style sheet; without either the run imports.
pub fn select_run_mode(revert: bool, style_sheet: Option<&str>) -> RunMode {
    if revert {
        return RunMode::Revert;
    }
    match style_sheet.map(str::trim).filter(|path| !path.is_empty()) {
        Some(path) => RunMode::Transform {
            style_sheet: PathBuf::from(path),
        },
        None => RunMode::Import,
    }
}

/// Check the settings a mode needs before anything touches disk or network.
pub fn validate(
    mode: &RunMode,
    export_dir: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<(), ConfigError> {
    if is_blank(Some(export_dir)) {
        return Err(ConfigError::MissingExportDirectory);
    }
    if *mode == RunMode::Import {
        if is_blank(username) {
            return Err(ConfigError::MissingUsername);
        }
        if is_blank(password) {
            return Err(ConfigError::MissingPassword);
        }
    }
    Ok(())
}

/// Export root with a trailing `/`.
pub fn normalize_export_dir(export_dir: &str) -> String {
    normalize_export_root(export_dir.trim())
}

/// Jira base URL with a trailing `/`, or [`DEFAULT_BASE_URL`] when blank.
pub fn normalize_base_url(base_url: Option<&str>) -> String {
    match base_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) if url.ends_with('/') => url.to_string(),
        Some(url) => format!("{url}/"),
        None => DEFAULT_BASE_URL.to_string(),
    }
}

/// Proxy host and port for one scheme, as given on the command line or in the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: Option<String>,
    pub port: Option<String>,
}

/// A usable proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
}

impl ProxySettings {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Pick the proxy matching the base URL's scheme.
///
/// The proxy only applies when the host is non-blank and the port is a
/// positive integer.
pub fn resolve_proxy(
    base_url: &str,
    http: &ProxyEndpoint,
    https: &ProxyEndpoint,
) -> Option<ProxySettings> {
    let endpoint = if base_url.starts_with("https") {
        https
    } else {
        http
    };

    let host = endpoint
        .host
        .as_deref()
        .map(str::trim)
        .filter(|host| !host.is_empty())?;
    let port = endpoint
        .port
        .as_deref()
        .and_then(|port| port.trim().parse::<u16>().ok())
        .filter(|port| *port > 0)?;

    Some(ProxySettings {
        host: host.to_string(),
        port,
    })
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}
