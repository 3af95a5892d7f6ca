//! `stencil sync` — track artifacts and fold their edits back into containers.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stencil_sync::{diff_all, rm_temp, status, sync_all, tracker, SyncOptions};

use super::{output, Project};

#[derive(Subcommand, Debug)]
pub enum SyncCommand {
    /// Show the state of every tracked artifact.
    Status(StatusArgs),

    /// List tracked artifacts with their blueprint and container.
    List,

    /// Track an artifact through its directory's ad-hoc container.
    Make(MakeArgs),

    /// Stop tracking a make-tracked artifact and delete its blueprint.
    #[command(name = "rm-temp", alias = "rmTemp")]
    RmTemp(RmTempArgs),

    /// Fold edited artifacts back into their containers.
    Run(RunArgs),

    /// Show the literal changes a sync would make.
    Diff(DiffArgs),
}

/// Arguments for `stencil sync make`.
#[derive(Args, Debug)]
pub struct MakeArgs {
    /// Artifact to track.
    pub path: PathBuf,

    /// Take over an artifact already tracked by a curated container.
    #[arg(long)]
    pub force: bool,

    /// Back up the container before writing.
    #[arg(long)]
    pub backup: bool,
}

impl MakeArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let mut project = Project::open(root)?;
        let outcome = tracker::make(
            &project.layout,
            &mut project.ledger,
            &self.path,
            self.force,
            self.backup,
        )
        .with_context(|| format!("make failed for '{}'", self.path.display()))?;

        let verb = if outcome.container_created {
            "created"
        } else {
            "updated"
        };
        println!(
            "✓ Tracking {} as '{}' ({verb} {})",
            project.rel(&outcome.path),
            outcome.id,
            project.rel(&outcome.container)
        );
        if outcome.took_over {
            println!("  Curated definition left in place; the artifact now syncs ad-hoc.");
        }
        Ok(())
    }
}

/// Arguments for `stencil sync rm-temp`.
#[derive(Args, Debug)]
pub struct RmTempArgs {
    /// Make-tracked artifact to release.
    pub path: PathBuf,

    /// Back up the container before writing.
    #[arg(long)]
    pub backup: bool,
}

impl RmTempArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let mut project = Project::open(root)?;
        let outcome = rm_temp(&project.layout, &mut project.ledger, &self.path, self.backup)
            .with_context(|| format!("rm-temp failed for '{}'", self.path.display()))?;

        println!(
            "✓ Stopped tracking {} ('{}')",
            project.rel(&outcome.path),
            outcome.id
        );
        if outcome.container_removed {
            println!("  Removed empty container {}", project.rel(&outcome.container));
        }
        Ok(())
    }
}

/// Arguments for `stencil sync run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only sync artifacts matching these globs or substrings.
    pub patterns: Vec<String>,

    /// Report what would be synced without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Re-sync artifacts even when they look unchanged.
    #[arg(long)]
    pub force: bool,

    /// Back up containers before overwriting them.
    #[arg(long)]
    pub backup: bool,

    /// Run the configured formatter over written containers.
    #[arg(long)]
    pub format: bool,
}

impl RunArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let mut project = Project::open(root)?;
        let opts = SyncOptions {
            patterns: self.patterns,
            force: self.force,
            dry_run: self.dry_run,
            backup: self.backup,
            adhoc_only: false,
        };
        run_sync(&mut project, &opts, self.format)
    }
}

/// Shared by `sync run` and `tmpl sync`.
pub fn run_sync(project: &mut Project, opts: &SyncOptions, format: bool) -> Result<()> {
    let report = sync_all(&project.layout, &mut project.ledger, opts).context("sync failed")?;
    output::print_sync_report(project, &report, opts.dry_run);

    if opts.dry_run && report.succeeded() > 0 {
        let (diffs, _) = diff_all(&project.layout, &project.ledger, &opts.patterns);
        for diff in diffs {
            print!("{}", diff.unified_diff);
        }
    }
    if format && !opts.dry_run {
        output::run_formatter(project, &report.containers_written);
    }
    Ok(())
}

/// Arguments for `stencil sync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Only diff artifacts matching these globs or substrings.
    pub patterns: Vec<String>,
}

impl DiffArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let project = Project::open(root)?;
        let (diffs, failures) = diff_all(&project.layout, &project.ledger, &self.patterns);

        if diffs.is_empty() && failures.is_empty() {
            println!("✓ All tracked artifacts match their blueprints");
            return Ok(());
        }
        for diff in &diffs {
            print!("{}", diff.unified_diff);
        }
        for (path, err) in &failures {
            output::print_failure(&project, path, err);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// status / list
// ---------------------------------------------------------------------------

/// Arguments for `stencil sync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusJson {
    artifact: String,
    state: &'static str,
    blueprint: String,
    container: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
}

impl StatusArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let project = Project::open(root)?;
        let entries = status(&project.layout, &project.ledger);
        if !self.json {
            output::print_status(&project, &entries);
            return Ok(());
        }
        let payload: Vec<StatusJson> = entries
            .into_iter()
            .map(|entry| StatusJson {
                artifact: project.rel(&entry.path),
                state: entry.state.label(),
                blueprint: entry.record.blueprint_id.0,
                container: project.rel(&entry.container),
                problem: entry.problem,
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
        );
        Ok(())
    }
}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "artifact")]
    artifact: String,
    #[tabled(rename = "blueprint")]
    blueprint: String,
    #[tabled(rename = "container")]
    container: String,
    #[tabled(rename = "hash")]
    hash: String,
}

fn list(project: &Project) {
    if project.ledger.is_empty() {
        println!("No tracked artifacts.");
        return;
    }
    let rows: Vec<ListRow> = project
        .ledger
        .iter()
        .map(|(path, record)| ListRow {
            artifact: project.rel(path),
            blueprint: record.blueprint_id.to_string(),
            container: record.container_locator.to_string(),
            hash: record.file_hash.0.chars().take(12).collect(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{} tracked artifact(s)", project.ledger.len().to_string().bold());
}

pub fn run(root: &Path, command: SyncCommand) -> Result<()> {
    match command {
        SyncCommand::Status(args) => args.run(root),
        SyncCommand::List => {
            let project = Project::open(root)?;
            list(&project);
            Ok(())
        }
        SyncCommand::Make(args) => args.run(root),
        SyncCommand::RmTemp(args) => args.run(root),
        SyncCommand::Run(args) => args.run(root),
        SyncCommand::Diff(args) => args.run(root),
    }
}

/// Fail the invocation when any item of a batch failed.
pub fn finish_batch(failed: usize) -> Result<()> {
    if failed > 0 {
        bail!("{failed} operation(s) failed");
    }
    Ok(())
}
