//! Shared terminal output: state tables, sync summaries, formatter warnings.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stencil_sync::{
    formatter, ArtifactOutcome, ArtifactState, StatusEntry, SyncError, SyncReport,
};

use super::Project;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

pub fn state_label(state: ArtifactState) -> &'static str {
    match state {
        ArtifactState::InSync => "IN SYNC",
        ArtifactState::Modified => "MODIFIED",
        ArtifactState::Missing => "MISSING",
    }
}

pub fn state_indicator(state: ArtifactState) -> String {
    match state {
        ArtifactState::InSync => "■".green().bold().to_string(),
        ArtifactState::Modified => "■".yellow().bold().to_string(),
        ArtifactState::Missing => "■".red().bold().to_string(),
    }
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "")]
    indicator: String,
    #[tabled(rename = "artifact")]
    artifact: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "blueprint")]
    blueprint: String,
    #[tabled(rename = "container")]
    container: String,
}

/// Print a state table followed by a one-line summary.
pub fn print_status(project: &Project, entries: &[StatusEntry]) {
    if entries.is_empty() {
        println!("No tracked artifacts.");
        return;
    }

    let rows: Vec<StatusRow> = entries
        .iter()
        .map(|entry| StatusRow {
            indicator: state_indicator(entry.state),
            artifact: project.rel(&entry.path),
            state: match &entry.problem {
                Some(problem) => format!("{} ({problem})", state_label(entry.state)),
                None => state_label(entry.state).to_string(),
            },
            blueprint: entry.record.blueprint_id.to_string(),
            container: project.rel(&entry.container),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let count = |state: ArtifactState| entries.iter().filter(|e| e.state == state).count();
    let modified = count(ArtifactState::Modified);
    let missing = count(ArtifactState::Missing);
    println!(
        "{} tracked: {} in sync, {modified} modified, {missing} missing",
        entries.len(),
        count(ArtifactState::InSync)
    );
    if modified > 0 {
        println!("Run 'stencil sync run' to fold edits back into their containers.");
    }
    if missing > 0 {
        println!("Missing artifacts are pruned from the ledger on the next sync.");
    }
}

// ---------------------------------------------------------------------------
// Sync reports
// ---------------------------------------------------------------------------

pub fn print_sync_report(project: &Project, report: &SyncReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if report.pruned > 0 {
        println!("{prefix}pruned {} record(s) for deleted artifacts", report.pruned);
    }
    if report.total() == 0 {
        println!("{prefix}✓ nothing to sync");
        return;
    }

    let mark = if report.succeeded() == report.total() {
        "✓".green().to_string()
    } else {
        "!".yellow().to_string()
    };
    println!(
        "{prefix}{mark} synced {}/{} artifact(s)",
        report.succeeded(),
        report.total()
    );

    for outcome in &report.outcomes {
        match outcome {
            ArtifactOutcome::Synced { path, id, container } => println!(
                "  ✎  {} → {}:{id}",
                project.rel(path),
                project.rel(container)
            ),
            ArtifactOutcome::WouldSync { path, id, container } => println!(
                "  ~  {} → {}:{id}",
                project.rel(path),
                project.rel(container)
            ),
            ArtifactOutcome::InSync { .. } => {}
            ArtifactOutcome::Failed { path, reason, .. } => {
                println!("  {}  {}: {reason}", "✗".red(), project.rel(path))
            }
        }
    }
}

/// Print `succeeded/total` for a batch of single-artifact operations.
pub fn print_batch_summary(verb: &str, succeeded: usize, total: usize) {
    let mark = if succeeded == total {
        "✓".green().to_string()
    } else {
        "!".yellow().to_string()
    };
    println!("{mark} {verb} {succeeded}/{total}");
}

pub fn print_failure(project: &Project, path: &Path, err: &SyncError) {
    println!("  {}  {}: {err}", "✗".red(), project.rel(path));
}

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

/// Run the configured formatter over `paths`; failures are warnings.
pub fn run_formatter(project: &Project, paths: &[PathBuf]) {
    let existing: Vec<PathBuf> = paths.iter().filter(|p| p.exists()).cloned().collect();
    if existing.is_empty() {
        return;
    }
    let Some(command) = project.layout.config().formatter.as_deref() else {
        eprintln!(
            "{} --format given but no formatter is configured in .stencil/config.yaml",
            "warning:".yellow().bold()
        );
        return;
    };
    let failures = formatter::format_containers(command, &existing);
    for failure in &failures {
        eprintln!("{} {failure}", "warning:".yellow().bold());
    }
    println!(
        "formatted {}/{} container(s)",
        existing.len() - failures.len(),
        existing.len()
    );
}
