//! Terminal rendering of run summaries

use colored::Colorize;
use jbtimporter_core::outcome::{BatchSummary, ImportSummary, IssueFailure};

use crate::pipeline::RunReport;
use crate::prelude::{println, *};

/// Print the report as a table, or as JSON when `json` is set.
pub fn display(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match report {
        RunReport::Import { summary } => display_import(summary),
        RunReport::Transform { summary } => display_batch("Transform", "Transformed", summary),
        RunReport::Revert { summary } => display_batch("Revert", "Reverted", summary),
    }

    Ok(())
}

fn display_import(summary: &ImportSummary) {
    println!(
        "\n{} - {} issues\n",
        "Import".bold().cyan(),
        summary.total().to_string().bright_white()
    );

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Succeeded".bold().cyan(),
        summary.succeeded.len().to_string().green().to_string()
    ]);
    table.add_row(prettytable::row![
        "File attachment errors".bold().cyan(),
        count(summary.file_attachment_errors.len())
    ]);
    table.add_row(prettytable::row![
        "Workflow transition errors".bold().cyan(),
        count(summary.workflow_transition_errors.len())
    ]);
    table.add_row(prettytable::row![
        "Other errors".bold().cyan(),
        count(summary.other_errors.len())
    ]);
    table.printstd();

    display_failures("File attachment errors", &summary.file_attachment_errors);
    display_failures(
        "Workflow transition errors",
        &summary.workflow_transition_errors,
    );
    display_failures("Other errors", &summary.other_errors);
}

fn display_batch(title: &str, changed_label: &str, summary: &BatchSummary) {
    println!(
        "\n{} - {} issues\n",
        title.bold().cyan(),
        summary.total().to_string().bright_white()
    );

    let mut table = new_table();
    table.add_row(prettytable::row![
        changed_label.bold().cyan(),
        summary.changed.len().to_string().green().to_string()
    ]);
    table.add_row(prettytable::row![
        "Unchanged".bold().cyan(),
        summary.unchanged.len().to_string().bright_black().to_string()
    ]);
    table.add_row(prettytable::row![
        "Failed".bold().cyan(),
        count(summary.failed.len())
    ]);
    table.printstd();

    display_failures("Failed", &summary.failed);
}

fn display_failures(title: &str, failures: &[IssueFailure]) {
    if failures.is_empty() {
        return;
    }

    let ids: Vec<&str> = failures.iter().map(|failure| failure.id.as_str()).collect();
    println!("\n{}: {}", title.bold().red(), ids.join(", "));

    let mut table = new_table();
    for failure in failures {
        table.add_row(prettytable::row![
            failure.id.bright_white().to_string(),
            failure.message.bright_black().to_string()
        ]);
    }
    table.printstd();
}

fn count(failed: usize) -> String {
    if failed == 0 {
        failed.to_string().bright_black().to_string()
    } else {
        failed.to_string().red().to_string()
    }
}
