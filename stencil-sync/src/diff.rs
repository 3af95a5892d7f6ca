//! Unified diff preview for `stencil sync diff` and dry runs.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use stencil_blueprint::literalize;
use stencil_core::{ArtifactRecord, BlueprintId, Layout, Ledger};

use crate::container::Container;
use crate::error::SyncError;
use crate::hasher::read_artifact;
use crate::reconcile::PathFilter;

/// Difference between a stored literal and the one the artifact now produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralDiff {
    pub path: PathBuf,
    pub id: BlueprintId,
    pub container: PathBuf,
    pub unified_diff: String,
}

/// Diff a single artifact. `None` when the stored literal is already current.
///
/// No files are written.
pub fn diff_artifact(
    layout: &Layout,
    ledger: &Ledger,
    path: &Path,
    record: &ArtifactRecord,
) -> Result<Option<LiteralDiff>, SyncError> {
    let container_path = layout.container_path(path, &record.container_locator);
    let container = Container::load(&container_path)?;
    diff_in(layout, &container, ledger, path, record)
}

fn diff_in(
    layout: &Layout,
    container: &Container,
    ledger: &Ledger,
    path: &Path,
    record: &ArtifactRecord,
) -> Result<Option<LiteralDiff>, SyncError> {
    let (content, _) = read_artifact(path)?;
    let rendered = literalize(&content, &ledger.parameters);
    let existing = container.literal(&record.blueprint_id).unwrap_or_default();
    if existing == rendered {
        return Ok(None);
    }

    let container_display = layout.display_path(container.path());
    let old_header = format!("a/{}:{}", container_display.display(), record.blueprint_id);
    let new_header = format!("b/{}", layout.display_path(path).display());
    let unified = TextDiff::from_lines(existing, rendered.as_str())
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(Some(LiteralDiff {
        path: path.to_path_buf(),
        id: record.blueprint_id.clone(),
        container: container.path().to_path_buf(),
        unified_diff: unified,
    }))
}

/// Diff every existing tracked artifact matching `patterns`.
///
/// Per-artifact failures are returned alongside the diffs.
pub fn diff_all(
    layout: &Layout,
    ledger: &Ledger,
    patterns: &[String],
) -> (Vec<LiteralDiff>, Vec<(PathBuf, SyncError)>) {
    let filter = PathFilter::new(patterns);
    let mut diffs = Vec::new();
    let mut failures = Vec::new();
    let mut loaded: Option<Container> = None;

    for (path, record) in ledger.iter() {
        if !filter.matches(path) || !path.exists() {
            continue;
        }
        let container_path = layout.container_path(path, &record.container_locator);
        if loaded.as_ref().map(Container::path) != Some(container_path.as_path()) {
            match Container::load(&container_path) {
                Ok(container) => loaded = Some(container),
                Err(err) => {
                    failures.push((path.clone(), err));
                    continue;
                }
            }
        }
        let Some(container) = loaded.as_ref() else {
            continue;
        };
        match diff_in(layout, container, ledger, path, record) {
            Ok(Some(diff)) => diffs.push(diff),
            Ok(None) => {}
            Err(err) => failures.push((path.clone(), err)),
        }
    }
    (diffs, failures)
}
