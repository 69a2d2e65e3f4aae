//! Runs one mode over every issue in the export index
//!
//! Only loading the index and obtaining the Jira token can stop a run. Every
//! other failure is recorded against its issue and the loop moves on.

use std::path::Path;

use colored::Colorize;
use jbtimporter_core::charmap::CharacterMap;
use jbtimporter_core::config::RunMode;
use jbtimporter_core::issue::IssueDescriptor;
use jbtimporter_core::jelly::SecurityToken;
use jbtimporter_core::lifecycle::{self, RevertOutcome, TransformApplied, TransformError};
use jbtimporter_core::manifest;
use jbtimporter_core::outcome::{classify_outcome, BatchSummary, ImportOutcome, ImportSummary};
use log::{debug, info, warn};
use serde::Serialize;

use crate::prelude::{eprintln, println, *};
use crate::remote::{Credentials, JellyRunnerClient, SubmissionClient, TokenProvider};
use crate::settings::ImporterConfig;
use crate::transform::{TransformStage, XsltProcess};

/// What a run did, per mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunReport {
    Import { summary: ImportSummary },
    Transform { summary: BatchSummary },
    Revert { summary: BatchSummary },
}

/// Load the export index and run the configured mode over it.
pub async fn execute(config: &ImporterConfig, verbose: bool) -> Result<RunReport, Error> {
    let issues = manifest::read_index(&config.export_root)?;
    info!(
        "Loaded {} issues from {}",
        issues.len(),
        manifest::index_path(&config.export_root).display()
    );

    match &config.mode {
        RunMode::Import => {
            let client =
                JellyRunnerClient::new(&config.base_url, config.proxy.as_ref(), config.timeout)
                    .map_err(Error::HttpClient)?;
            let summary =
                run_import(&client, &client, &config.credentials, &issues, verbose).await?;
            Ok(RunReport::Import { summary })
        }
        RunMode::Transform { style_sheet } => {
            let character_map = CharacterMap::bugtrack_default();
            let summary = match XsltProcess::from_command_line(&config.xslt_command) {
                Ok(engine) => {
                    let stage = TransformStage::new(engine, character_map, style_sheet.clone());
                    info!(
                        "Transforming with {} and {}",
                        stage.engine().program().display(),
                        stage.style_sheet().display()
                    );
                    run_transform(&issues, verbose, |source| stage.transform(source))
                }
                Err(err) => {
                    warn!("XSLT processor unavailable: {err}");
                    let message = match err {
                        TransformError::Engine(message) => message,
                        err => err.to_string(),
                    };
                    run_transform(&issues, verbose, |_| {
                        Err(TransformError::Engine(message.clone()))
                    })
                }
            };
            Ok(RunReport::Transform { summary })
        }
        RunMode::Revert => Ok(RunReport::Revert {
            summary: run_revert(&issues, verbose),
        }),
    }
}

/// Submit every payload, in index order, with a single token.
pub async fn run_import<T, S>(
    tokens: &T,
    client: &S,
    credentials: &Credentials,
    issues: &[IssueDescriptor],
    verbose: bool,
) -> Result<ImportSummary, Error>
where
    T: TokenProvider,
    S: SubmissionClient,
{
    let token = tokens.obtain_token(credentials).await?;
    if token.is_empty() {
        return Err(Error::Authentication(f!(
            "Jira returned no security token for user `{}`",
            credentials.username
        )));
    }
    debug!("Obtained security token");

    let mut summary = ImportSummary::default();
    for issue in issues {
        if verbose {
            println!("Importing issue {}: {}", issue.id.bold(), issue.full_path_string());
        }

        let outcome = import_issue(client, &token, credentials, issue).await;
        if let Some(diagnostic) = outcome.diagnostic() {
            eprintln!("{} {}: {}", "Failed".red(), outcome.id(), diagnostic);
        }
        summary.record(outcome);
    }

    Ok(summary)
}

async fn import_issue<S: SubmissionClient>(
    client: &S,
    token: &SecurityToken,
    credentials: &Credentials,
    issue: &IssueDescriptor,
) -> ImportOutcome {
    let other_error = |diagnostic: String| ImportOutcome::OtherError {
        id: issue.id.clone(),
        diagnostic,
    };

    let payload = match tokio::fs::read_to_string(issue.full_path()).await {
        Ok(payload) => payload,
        Err(err) => return other_error(f!("ERROR loading XML: {err}")),
    };
    if payload.trim().is_empty() {
        return other_error("ERROR: The file was empty".to_string());
    }

    match client.submit(token, credentials, &payload).await {
        Ok(outcome) => {
            debug!("Issue {} returned {:?}", issue.id, outcome.kind);
            classify_outcome(&issue.id, &outcome)
        }
        Err(err) => other_error(Error::from(err).to_string()),
    }
}

/// Rewrite every payload through `transform`, keeping `.old` backups.
pub fn run_transform<F>(issues: &[IssueDescriptor], verbose: bool, transform: F) -> BatchSummary
where
    F: Fn(&Path) -> Result<Vec<u8>, TransformError>,
{
    let mut summary = BatchSummary::default();
    for issue in issues {
        let path = issue.full_path();
        if verbose {
            println!(
                "Transforming issue {}: {} ({:?})",
                issue.id.bold(),
                path.display(),
                lifecycle::file_state(&path)
            );
        }

        match lifecycle::apply_transform(&path, &transform) {
            Ok(TransformApplied::BackupCreated) => {
                debug!("Backed up {}", path.display());
                summary.record_changed(&issue.id);
            }
            Ok(TransformApplied::BackupReused) => {
                debug!("Transformed {} again from its backup", path.display());
                summary.record_changed(&issue.id);
            }
            Err(err) => record_failure(&mut summary, &issue.id, err.into()),
        }
    }

    summary
}

/// Restore every payload that has a backup.
pub fn run_revert(issues: &[IssueDescriptor], verbose: bool) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for issue in issues {
        let path = issue.full_path();
        if verbose {
            println!("Reverting issue {}: {}", issue.id.bold(), path.display());
        }

        match lifecycle::revert(&path) {
            Ok(RevertOutcome::Restored) => summary.record_changed(&issue.id),
            Ok(RevertOutcome::NoBackup) => {
                debug!("No backup for {}", path.display());
                summary.record_unchanged(&issue.id);
            }
            Err(err) => record_failure(&mut summary, &issue.id, err.into()),
        }
    }

    summary
}

fn record_failure(summary: &mut BatchSummary, id: &str, err: Error) {
    eprintln!("{} {}: {}", "Failed".red(), id, err);
    summary.record_failure(id, err.to_string());
}
