//! Reconciler — folds edited artifacts back into their containers.
//!
//! ## `sync_all` protocol
//!
//! 1. Prune ledger records whose artifact no longer exists.
//! 2. Filter the remaining records by the requested patterns.
//! 3. Group records by resolved container path; load each container once.
//! 4. For each record that needs syncing: read → hash → literalize → write
//!    the definition in memory.
//! 5. Save each touched container once.
//! 6. Update ledger hashes for artifacts whose container was saved.
//! 7. Save the ledger once, if anything changed.
//!
//! One artifact failing never stops the others; only ledger persistence
//! failures abort the run.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use glob::Pattern;

use stencil_blueprint::literalize;
use stencil_core::{ledger, ArtifactRecord, BlueprintId, ContentHash, Layout, Ledger, ParameterSet};

use crate::container::{Container, Placement, SaveOutcome};
use crate::error::{ErrorKind, SyncError};
use crate::hasher::{hash_file, read_artifact};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Reconciliation state of one tracked artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    /// Hash matches the ledger and the container holds the definition.
    InSync,
    /// Edited since the last sync, or its definition is missing.
    Modified,
    /// The artifact no longer exists; the record will be pruned.
    Missing,
}

impl ArtifactState {
    pub fn label(self) -> &'static str {
        match self {
            ArtifactState::InSync => "in-sync",
            ArtifactState::Modified => "modified",
            ArtifactState::Missing => "missing",
        }
    }
}

/// Classify `path` against its record, loading the container.
pub fn classify(
    layout: &Layout,
    path: &Path,
    record: &ArtifactRecord,
) -> Result<ArtifactState, SyncError> {
    if !path.exists() {
        return Ok(ArtifactState::Missing);
    }
    let container = Container::load(&layout.container_path(path, &record.container_locator))?;
    classify_in(&container, path, record)
}

fn classify_in(
    container: &Container,
    path: &Path,
    record: &ArtifactRecord,
) -> Result<ArtifactState, SyncError> {
    if !path.exists() {
        return Ok(ArtifactState::Missing);
    }
    let hash = hash_file(path)?;
    if hash == record.file_hash && container.contains(&record.blueprint_id) {
        Ok(ArtifactState::InSync)
    } else {
        Ok(ArtifactState::Modified)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub path: PathBuf,
    pub record: ArtifactRecord,
    pub container: PathBuf,
    pub state: ArtifactState,
    /// Set when the artifact or container could not be inspected.
    pub problem: Option<String>,
}

/// Classify every record without touching disk.
pub fn status(layout: &Layout, ledger: &Ledger) -> Vec<StatusEntry> {
    let mut containers: HashMap<PathBuf, Result<Container, String>> = HashMap::new();
    let mut entries = Vec::new();

    for (path, record) in ledger.iter() {
        let container_path = layout.container_path(path, &record.container_locator);
        let loaded = containers
            .entry(container_path.clone())
            .or_insert_with(|| Container::load(&container_path).map_err(|e| e.to_string()));

        let (state, problem) = match loaded {
            Err(reason) => (ArtifactState::Modified, Some(reason.clone())),
            Ok(container) => match classify_in(container, path, record) {
                Ok(state) => (state, container.corruption().map(str::to_string)),
                Err(e) => (ArtifactState::Modified, Some(e.to_string())),
            },
        };
        entries.push(StatusEntry {
            path: path.clone(),
            record: record.clone(),
            container: container_path,
            state,
            problem,
        });
    }
    entries
}

// ---------------------------------------------------------------------------
// Pattern filter
// ---------------------------------------------------------------------------

/// Matches artifact paths against user patterns.
///
/// A pattern matches when it globs the full path or the file name, or when it
/// occurs as a substring of the path. No patterns matches everything.
#[derive(Debug, Default)]
pub struct PathFilter {
    patterns: Vec<(String, Option<Pattern>)>,
}

impl PathFilter {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| (p.clone(), Pattern::new(p).ok()))
                .collect(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let full = path.to_string_lossy();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.patterns.iter().any(|(raw, glob)| {
            full.contains(raw.as_str())
                || glob
                    .as_ref()
                    .is_some_and(|g| g.matches(&full) || g.matches(&name))
        })
    }
}

// ---------------------------------------------------------------------------
// sync_all
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub patterns: Vec<String>,
    /// Re-sync even artifacts that classify as in-sync.
    pub force: bool,
    pub dry_run: bool,
    /// Copy containers into the backup directory before overwriting.
    pub backup: bool,
    /// Only consider `make`-tracked artifacts.
    pub adhoc_only: bool,
}

/// Per-artifact result of a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    Synced {
        path: PathBuf,
        id: BlueprintId,
        container: PathBuf,
    },
    WouldSync {
        path: PathBuf,
        id: BlueprintId,
        container: PathBuf,
    },
    InSync {
        path: PathBuf,
    },
    Failed {
        path: PathBuf,
        kind: ErrorKind,
        reason: String,
    },
}

impl ArtifactOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ArtifactOutcome::Synced { path, .. }
            | ArtifactOutcome::WouldSync { path, .. }
            | ArtifactOutcome::InSync { path }
            | ArtifactOutcome::Failed { path, .. } => path,
        }
    }

    fn failed(path: &Path, err: &SyncError) -> Self {
        ArtifactOutcome::Failed {
            path: path.to_path_buf(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<ArtifactOutcome>,
    pub pruned: usize,
    /// Containers written during this run, in write order.
    pub containers_written: Vec<PathBuf>,
    pub ledger_saved: bool,
}

impl SyncReport {
    /// Artifacts that were (or in dry-run would be) synced.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ArtifactOutcome::Synced { .. } | ArtifactOutcome::WouldSync { .. }))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ArtifactOutcome::Failed { .. }))
    }

    /// Artifacts that needed syncing (in-sync ones excluded).
    pub fn total(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o, ArtifactOutcome::InSync { .. }))
            .count()
    }
}

/// Sync every tracked artifact matching `opts.patterns` back into its container.
pub fn sync_all(
    layout: &Layout,
    ledger: &mut Ledger,
    opts: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport {
        pruned: ledger.prune(),
        ..SyncReport::default()
    };

    let filter = PathFilter::new(&opts.patterns);
    let mut groups: BTreeMap<PathBuf, Vec<(PathBuf, ArtifactRecord)>> = BTreeMap::new();
    for (path, record) in ledger.iter() {
        if opts.adhoc_only && !record.container_locator.is_adhoc() {
            continue;
        }
        if filter.matches(path) {
            groups
                .entry(layout.container_path(path, &record.container_locator))
                .or_default()
                .push((path.clone(), record.clone()));
        }
    }

    let backup_dir = layout.backup_dir();
    let backup_dir = opts.backup.then_some(backup_dir.as_path());
    let mut synced_hashes: Vec<(PathBuf, ContentHash)> = Vec::new();

    for (container_path, members) in groups {
        let mut container = match Container::load(&container_path) {
            Ok(container) => container,
            Err(err) => {
                tracing::warn!(container = %container_path.display(), error = %err, "cannot load container");
                for (path, _) in &members {
                    report.outcomes.push(ArtifactOutcome::failed(path, &err));
                }
                continue;
            }
        };

        let mut pending: Vec<(PathBuf, BlueprintId, ContentHash)> = Vec::new();
        for (path, record) in members {
            match sync_member(&mut container, &path, &record, &ledger.parameters, opts.force) {
                Ok(Some(hash)) => pending.push((path, record.blueprint_id, hash)),
                Ok(None) => report.outcomes.push(ArtifactOutcome::InSync { path }),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "sync failed");
                    report.outcomes.push(ArtifactOutcome::failed(&path, &err));
                }
            }
        }
        if pending.is_empty() {
            continue;
        }

        if opts.dry_run {
            for (path, id, _) in pending {
                tracing::info!("[dry-run] would sync: {}", path.display());
                report.outcomes.push(ArtifactOutcome::WouldSync {
                    path,
                    id,
                    container: container_path.clone(),
                });
            }
            continue;
        }

        match container.save(backup_dir) {
            Ok(saved) => {
                if matches!(saved, SaveOutcome::Written { .. }) {
                    report.containers_written.push(container_path.clone());
                }
                for (path, id, hash) in pending {
                    synced_hashes.push((path.clone(), hash));
                    report.outcomes.push(ArtifactOutcome::Synced {
                        path,
                        id,
                        container: container_path.clone(),
                    });
                }
            }
            Err(err) => {
                tracing::warn!(container = %container_path.display(), error = %err, "cannot save container");
                for (path, _, _) in &pending {
                    report.outcomes.push(ArtifactOutcome::failed(path, &err));
                }
            }
        }
    }

    for (path, hash) in &synced_hashes {
        if let Some(record) = ledger.get_mut(path) {
            record.file_hash = hash.clone();
        }
    }

    if !opts.dry_run && (!synced_hashes.is_empty() || report.pruned > 0) {
        ledger::save_at(&layout.ledger_path(), ledger)?;
        report.ledger_saved = true;
    }
    Ok(report)
}

/// Fold one artifact into `container`. Returns the new hash when the
/// definition was (re)written, `None` when the artifact was already in sync.
fn sync_member(
    container: &mut Container,
    path: &Path,
    record: &ArtifactRecord,
    params: &ParameterSet,
    force: bool,
) -> Result<Option<ContentHash>, SyncError> {
    let (content, hash) = read_artifact(path)?;
    if !force && hash == record.file_hash && container.contains(&record.blueprint_id) {
        return Ok(None);
    }
    let literal = literalize(&content, params);
    let placement = if record.container_locator.is_adhoc() {
        Placement::Append
    } else {
        Placement::AfterClass
    };
    let outcome = container.write_definition(&record.blueprint_id, &literal, placement)?;
    tracing::debug!(path = %path.display(), id = %record.blueprint_id, ?outcome, "definition written");
    Ok(Some(hash))
}
