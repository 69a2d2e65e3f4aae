use crate::prelude::{println, *};
use clap::Parser;

mod error;
mod pipeline;
mod prelude;
mod remote;
mod report;
mod settings;
mod transform;

/// Imports BugTrack XML exports into Jira through its Jelly runner.
///
/// Without `--xslt` or `--revert` every issue payload is submitted to Jira.
#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
pub struct App {
    /// Directory holding the export's index.xml
    #[clap(short = 'd', long, env = "JBT_EXPORT_DIR")]
    export_dir: Option<String>,

    /// Jira username
    #[clap(short, long, env = "JIRA_USERNAME")]
    username: Option<String>,

    /// Jira password
    #[clap(short, long, env = "JIRA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Jira base URL
    #[clap(short, long, env = "JIRA_BASE_URL", default_value = jbtimporter_core::config::DEFAULT_BASE_URL)]
    base_url: Option<String>,

    /// Rewrite every payload through this XSL style sheet instead of importing
    #[clap(short = 'x', long)]
    xslt: Option<String>,

    /// Restore every payload from its .old backup instead of importing
    #[clap(short, long)]
    revert: bool,

    /// XSLT processor command; the style sheet and source file are appended
    #[clap(long, env = "JBT_XSLT_COMMAND", default_value = crate::transform::DEFAULT_COMMAND)]
    xslt_command: String,

    /// HTTP request timeout in seconds
    #[clap(long, default_value_t = 60)]
    timeout: u64,

    /// Proxy host used for http:// base URLs
    #[clap(long, env = "HTTP_PROXY_HOST")]
    http_proxy_host: Option<String>,

    /// Proxy port used for http:// base URLs
    #[clap(long, env = "HTTP_PROXY_PORT")]
    http_proxy_port: Option<String>,

    /// Proxy host used for https:// base URLs
    #[clap(long, env = "HTTPS_PROXY_HOST")]
    https_proxy_host: Option<String>,

    /// Proxy port used for https:// base URLs
    #[clap(long, env = "HTTPS_PROXY_PORT")]
    https_proxy_port: Option<String>,

    /// Print the summary as JSON
    #[clap(long)]
    json: bool,

    /// Whether to display additional information.
    #[clap(short, long, env = "JBT_VERBOSE", default_value = "false")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();
    let config = settings::ImporterConfig::from_app(&app)?;

    if app.verbose {
        println!("Running {} on {}", config.mode.name(), config.export_root);
    }

    let report = pipeline::execute(&config, app.verbose)
        .await
        .with_context(|| f!("The {} run stopped", config.mode.name()))?;

    report::display(&report, app.json)
}
