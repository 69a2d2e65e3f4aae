use std::time::Duration;

use jbtimporter_core::config::{
    normalize_base_url, normalize_export_dir, resolve_proxy, select_run_mode, validate,
    ProxyEndpoint, ProxySettings, RunMode,
};

use crate::prelude::*;
use crate::remote::Credentials;
use crate::App;

/// Everything one run needs, validated and normalized.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    pub mode: RunMode,
    /// Export directory with a trailing `/`.
    pub export_root: String,
    /// Jira base URL with a trailing `/`.
    pub base_url: String,
    pub credentials: Credentials,
    pub proxy: Option<ProxySettings>,
    pub timeout: Duration,
    pub xslt_command: String,
}

impl ImporterConfig {
    /// Build the configuration from the parsed command line.
    ///
    /// Credentials are only required when importing.
    pub fn from_app(app: &App) -> Result<Self, Error> {
        let mode = select_run_mode(app.revert, app.xslt.as_deref());
        let export_dir = app.export_dir.as_deref().unwrap_or_default();

        validate(
            &mode,
            export_dir,
            app.username.as_deref(),
            app.password.as_deref(),
        )?;

        let base_url = normalize_base_url(app.base_url.as_deref());
        let proxy = resolve_proxy(
            &base_url,
            &ProxyEndpoint {
                host: app.http_proxy_host.clone(),
                port: app.http_proxy_port.clone(),
            },
            &ProxyEndpoint {
                host: app.https_proxy_host.clone(),
                port: app.https_proxy_port.clone(),
            },
        );

        Ok(Self {
            mode,
            export_root: normalize_export_dir(export_dir),
            base_url,
            credentials: Credentials {
                username: app.username.clone().unwrap_or_default(),
                password: app.password.clone().unwrap_or_default(),
            },
            proxy,
            timeout: Duration::from_secs(app.timeout),
            xslt_command: app.xslt_command.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use jbtimporter_core::config::ConfigError;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> App {
        App::try_parse_from(std::iter::once("jbtimporter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_import_config() {
        let app = parse(&["-d", "/data/export", "-u", "admin", "-p", "secret"]);
        let config = ImporterConfig::from_app(&app).unwrap();

        assert_eq!(config.mode, RunMode::Import);
        assert_eq!(config.export_root, "/data/export/");
        assert_eq!(config.credentials.username, "admin");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_import_requires_password() {
        let app = parse(&["-d", "/data/export", "-u", "admin"]);
        let result = ImporterConfig::from_app(&app);

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingPassword))
        ));
    }

    #[test]
    fn test_transform_needs_no_credentials() {
        let app = parse(&["-d", "/data/export", "-x", "style.xsl"]);
        let config = ImporterConfig::from_app(&app).unwrap();

        assert_eq!(
            config.mode,
            RunMode::Transform {
                style_sheet: PathBuf::from("style.xsl")
            }
        );
    }

    #[test]
    fn test_revert_wins_over_style_sheet() {
        let app = parse(&["-d", "/data/export", "-x", "style.xsl", "-r"]);
        let config = ImporterConfig::from_app(&app).unwrap();

        assert_eq!(config.mode, RunMode::Revert);
    }

    #[test]
    fn test_missing_export_directory() {
        let app = parse(&["-r"]);
        let result = ImporterConfig::from_app(&app);

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingExportDirectory))
        ));
    }

    #[test]
    fn test_https_proxy_selected_by_scheme() {
        let app = parse(&[
            "-d",
            "/data/export",
            "-r",
            "-b",
            "https://jira.example.com",
            "--http-proxy-host",
            "plain.proxy",
            "--http-proxy-port",
            "3128",
            "--https-proxy-host",
            "secure.proxy",
            "--https-proxy-port",
            "8443",
        ]);
        let config = ImporterConfig::from_app(&app).unwrap();

        assert_eq!(config.base_url, "https://jira.example.com/");
        assert_eq!(
            config.proxy,
            Some(ProxySettings {
                host: "secure.proxy".to_string(),
                port: 8443
            })
        );
    }
}
