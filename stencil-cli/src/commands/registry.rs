//! `stencil registry` — rebuild or check the aggregate command registry.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use stencil_sync::registry::{self, BuildResult, Drift, ScanIssue};

use super::Project;

#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// Print the registry rebuilt from per-command descriptors (writes nothing).
    Build,

    /// Report where the registry disagrees with the descriptors.
    Verify,

    /// Rebuild the registry and write it.
    Repair,
}

pub fn run(root: &Path, command: RegistryCommand) -> Result<()> {
    let project = Project::open(root)?;
    match command {
        RegistryCommand::Build => {
            let result = registry::build_from_source(&project.layout).context("registry build failed")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&result.document)
                    .context("failed to serialize registry JSON")?
            );
            print_build_summary(&project, &result, false);
        }
        RegistryCommand::Verify => {
            let report = registry::verify(&project.layout).context("registry verify failed")?;
            for drift in &report.drifts {
                println!("  {}  {}", "✗".red(), describe(&project, drift));
            }
            print_issues(&project, &report.issues);
            let clean = report.checked.saturating_sub(
                report
                    .drifts
                    .iter()
                    .filter(|d| !matches!(d, Drift::OrphanEntry { .. }))
                    .map(Drift::command)
                    .collect::<BTreeSet<_>>()
                    .len(),
            );
            if report.is_clean() {
                println!("✓ registry matches {} command(s)", report.checked);
            } else {
                println!(
                    "! {clean}/{} command(s) consistent, {} drift(s)",
                    report.checked,
                    report.drifts.len()
                );
                println!("Run 'stencil registry repair' to rebuild it.");
            }
        }
        RegistryCommand::Repair => {
            let result = registry::repair(&project.layout).context("registry repair failed")?;
            print_build_summary(&project, &result, true);
        }
    }
    Ok(())
}

fn print_build_summary(project: &Project, result: &BuildResult, written: bool) {
    let target = project.rel(&project.layout.registry_path());
    let verb = if written { "wrote" } else { "built" };
    eprintln!(
        "✓ {verb} {target}: {} command(s) from {} descriptor(s)",
        result.document.len(),
        result.fragments
    );
    if !result.preserved.is_empty() {
        eprintln!("  kept without source: {}", result.preserved.join(", "));
    }
    print_issues(project, &result.issues);
}

fn print_issues(project: &Project, issues: &[ScanIssue]) {
    for issue in issues {
        eprintln!(
            "  {}  {}: {}",
            "skipped".yellow(),
            project.rel(&issue.path),
            issue.reason
        );
    }
}

fn describe(project: &Project, drift: &Drift) -> String {
    match drift {
        Drift::MissingSection { command, source } => {
            format!("{command}: missing from registry (described in {})", project.rel(source))
        }
        Drift::DescriptionMismatch {
            command,
            expected,
            found,
            ..
        } => format!("{command}: description is {found:?}, descriptor says {expected:?}"),
        Drift::CountMismatch {
            command,
            field,
            expected,
            found,
            ..
        } => format!("{command}: {found} {field} in registry, descriptor has {expected}"),
        Drift::OrphanEntry { command } => format!("{command}: no descriptor defines it"),
    }
}
