//! `stencil tmpl` — manage make-tracked blueprints and promote them into
//! curated containers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use stencil_sync::{status, tracker, SyncOptions};

use super::sync::{finish_batch, run_sync, MakeArgs};
use super::{output, Project};

#[derive(Subcommand, Debug)]
pub enum TmplCommand {
    /// Show the state of make-tracked artifacts.
    Status,

    /// Track an artifact through its directory's ad-hoc container.
    Make(MakeArgs),

    /// Sync make-tracked artifacts into their ad-hoc containers.
    Sync(TmplSyncArgs),

    /// List make-tracked artifacts not yet moved into a curated container.
    #[command(name = "list-new", alias = "listNew")]
    ListNew,

    /// Move make-tracked blueprints into a curated container.
    Trans(TransArgs),
}

/// Arguments for `stencil tmpl sync`.
#[derive(Args, Debug)]
pub struct TmplSyncArgs {
    /// Only sync artifacts matching these globs or substrings.
    pub patterns: Vec<String>,

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

/// Arguments for `stencil tmpl trans`.
#[derive(Args, Debug)]
pub struct TransArgs {
    /// Make-tracked artifacts to transfer.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Target container (defaults to `curated_container` from the config).
    #[arg(long, value_name = "CONTAINER")]
    pub into: Option<PathBuf>,

    /// Back up containers before overwriting them.
    #[arg(long)]
    pub backup: bool,

    /// Run the configured formatter over written containers.
    #[arg(long)]
    pub format: bool,
}

impl TransArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let mut project = Project::open(root)?;
        let into = match self.into {
            Some(into) => into,
            None => project
                .layout
                .curated_container()
                .context("no target container: pass --into or set curated_container in .stencil/config.yaml")?,
        };

        let total = self.paths.len();
        let mut touched = BTreeSet::new();
        let mut failed = 0;
        for path in &self.paths {
            match tracker::transfer(&project.layout, &mut project.ledger, path, &into, self.backup) {
                Ok(outcome) => {
                    println!(
                        "  ✎  {} → {}:{}",
                        project.rel(&outcome.path),
                        project.rel(&outcome.into),
                        outcome.id
                    );
                    touched.insert(outcome.into);
                    touched.insert(outcome.from);
                }
                // The ledger may no longer match the containers; stop here.
                Err(err) if err.is_fatal() => {
                    return Err(anyhow::Error::new(err)
                        .context(format!("transfer aborted at '{}'", path.display())));
                }
                Err(err) => {
                    failed += 1;
                    output::print_failure(&project, path, &err);
                }
            }
        }
        output::print_batch_summary("transferred", total - failed, total);

        if self.format {
            let touched: Vec<PathBuf> = touched.into_iter().collect();
            output::run_formatter(&project, &touched);
        }
        finish_batch(failed)
    }
}

#[derive(Tabled)]
struct NewRow {
    #[tabled(rename = "artifact")]
    artifact: String,
    #[tabled(rename = "blueprint")]
    blueprint: String,
    #[tabled(rename = "container")]
    container: String,
}

fn list_new(project: &Project) {
    let rows: Vec<NewRow> = project
        .ledger
        .adhoc()
        .map(|(path, record)| NewRow {
            artifact: project.rel(path),
            blueprint: record.blueprint_id.to_string(),
            container: project.rel(&project.layout.adhoc_container_for(path)),
        })
        .collect();
    if rows.is_empty() {
        println!("No make-tracked artifacts.");
        return;
    }
    let count = rows.len();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{count} new blueprint(s); move them with 'stencil tmpl trans'.");
}

pub fn run(root: &Path, command: TmplCommand) -> Result<()> {
    match command {
        TmplCommand::Status => {
            let project = Project::open(root)?;
            let entries: Vec<_> = status(&project.layout, &project.ledger)
                .into_iter()
                .filter(|entry| entry.record.container_locator.is_adhoc())
                .collect();
            output::print_status(&project, &entries);
            Ok(())
        }
        TmplCommand::Make(args) => args.run(root),
        TmplCommand::Sync(args) => {
            let mut project = Project::open(root)?;
            let opts = SyncOptions {
                patterns: args.patterns,
                force: args.force,
                dry_run: false,
                backup: args.backup,
                adhoc_only: true,
            };
            run_sync(&mut project, &opts, args.format)
        }
        TmplCommand::ListNew => {
            let project = Project::open(root)?;
            list_new(&project);
            Ok(())
        }
        TmplCommand::Trans(args) => args.run(root),
    }
}
