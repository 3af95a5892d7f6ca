//! Ad-hoc tracking: `make`, `rm_temp`, and transfer into a curated container.

use std::path::{Path, PathBuf};

use stencil_blueprint::literalize;
use stencil_core::{ledger, ArtifactRecord, BlueprintId, ContainerLocator, Layout, Ledger};

use crate::container::{Container, DeleteOutcome, Placement};
use crate::error::{io_err, SyncError};
use crate::hasher::read_artifact;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeOutcome {
    pub path: PathBuf,
    pub id: BlueprintId,
    pub container: PathBuf,
    pub container_created: bool,
    /// A curated record was replaced by an ad-hoc one.
    pub took_over: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmTempOutcome {
    pub path: PathBuf,
    pub id: BlueprintId,
    pub container: PathBuf,
    pub container_removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub path: PathBuf,
    pub id: BlueprintId,
    pub from: PathBuf,
    pub into: PathBuf,
}

fn backup_dir(layout: &Layout, backup: bool) -> Option<PathBuf> {
    backup.then(|| layout.backup_dir())
}

/// Start tracking `path` through its directory's ad-hoc container.
///
/// The current content is literalized and written immediately. Taking over
/// an artifact tracked by a curated container requires `confirm`; the
/// curated definition itself is left in place.
pub fn make(
    layout: &Layout,
    ledger: &mut Ledger,
    path: &Path,
    confirm: bool,
    backup: bool,
) -> Result<MakeOutcome, SyncError> {
    let path = layout.artifact_path(path);
    if !path.is_file() {
        return Err(io_err(
            &path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "artifact is not a file"),
        ));
    }

    let existing = ledger.get(&path).cloned();
    let took_over = match &existing {
        Some(record) if !record.container_locator.is_adhoc() => {
            if !confirm {
                return Err(SyncError::NotAuthorized {
                    path,
                    reason: format!(
                        "tracked by curated container {}; confirm to take it over",
                        record.container_locator
                    ),
                });
            }
            true
        }
        _ => false,
    };

    let container_path = layout.adhoc_container_for(&path);
    let mut container = Container::load(&container_path)?;
    let id = match &existing {
        Some(record) if record.container_locator.is_adhoc() => record.blueprint_id.clone(),
        _ => derive_id(layout, ledger, &path, &container),
    };

    let (content, hash) = read_artifact(&path)?;
    let literal = literalize(&content, &ledger.parameters);

    let container_created = !container.exists_on_disk();
    container.write_definition(&id, &literal, Placement::Append)?;
    container.save(backup_dir(layout, backup).as_deref())?;

    ledger.upsert(
        path.clone(),
        ArtifactRecord {
            file_hash: hash,
            blueprint_id: id.clone(),
            container_locator: ContainerLocator::AdHoc,
        },
    );
    ledger::save_at(&layout.ledger_path(), ledger)?;

    tracing::info!(path = %path.display(), id = %id, container = %container_path.display(), "tracking artifact");
    Ok(MakeOutcome {
        path,
        id,
        container: container_path,
        container_created,
        took_over,
    })
}

/// Stop tracking a `make`-tracked artifact and delete its definition.
///
/// Curated records are refused without touching anything.
pub fn rm_temp(
    layout: &Layout,
    ledger: &mut Ledger,
    path: &Path,
    backup: bool,
) -> Result<RmTempOutcome, SyncError> {
    let path = layout.artifact_path(path);
    let record = ledger
        .get(&path)
        .cloned()
        .ok_or_else(|| SyncError::NotTracked { path: path.clone() })?;
    if !record.container_locator.is_adhoc() {
        return Err(SyncError::NotAuthorized {
            path,
            reason: format!(
                "tracked by curated container {}, not through make",
                record.container_locator
            ),
        });
    }

    let container_path = layout.adhoc_container_for(&path);
    let mut container = Container::load(&container_path)?;
    let deleted = container.delete_definition(&record.blueprint_id)?;
    container.save(backup_dir(layout, backup).as_deref())?;

    ledger.remove(&path);
    ledger::save_at(&layout.ledger_path(), ledger)?;

    tracing::info!(path = %path.display(), id = %record.blueprint_id, "stopped tracking artifact");
    Ok(RmTempOutcome {
        path,
        id: record.blueprint_id,
        container: container_path,
        container_removed: deleted == DeleteOutcome::ContainerRemoved,
    })
}

/// Move a `make`-tracked definition into the curated container `into`.
///
/// The definition is refreshed from the artifact's current content and
/// inserted after its class siblings; the record then points at `into`.
pub fn transfer(
    layout: &Layout,
    ledger: &mut Ledger,
    path: &Path,
    into: &Path,
    backup: bool,
) -> Result<TransferOutcome, SyncError> {
    let path = layout.artifact_path(path);
    let record = ledger
        .get(&path)
        .cloned()
        .ok_or_else(|| SyncError::NotTracked { path: path.clone() })?;
    if !record.container_locator.is_adhoc() {
        return Err(SyncError::NotAuthorized {
            path,
            reason: "only make-tracked artifacts can be transferred".to_string(),
        });
    }

    let from = layout.adhoc_container_for(&path);
    let into = layout.resolve(into);
    if into == from {
        return Err(SyncError::NotAuthorized {
            path,
            reason: "target is the artifact's own ad-hoc container".to_string(),
        });
    }
    if let Some(owner) = owner_of(layout, ledger, &into, &record.blueprint_id) {
        return Err(SyncError::NotAuthorized {
            path,
            reason: format!(
                "{} already holds '{}' for {}",
                layout.display_path(&into).display(),
                record.blueprint_id,
                layout.display_path(&owner).display()
            ),
        });
    }

    let mut target = Container::load(&into)?;
    if target.contains(&record.blueprint_id) {
        return Err(SyncError::NotAuthorized {
            path,
            reason: format!(
                "{} already holds an untracked definition '{}'",
                layout.display_path(&into).display(),
                record.blueprint_id
            ),
        });
    }

    let (content, hash) = read_artifact(&path)?;
    let literal = literalize(&content, &ledger.parameters);

    let mut source = Container::load(&from)?;
    target.write_definition(&record.blueprint_id, &literal, Placement::AfterClass)?;
    source.delete_definition(&record.blueprint_id)?;

    let backup_dir = backup_dir(layout, backup);
    target.save(backup_dir.as_deref())?;
    source.save(backup_dir.as_deref())?;

    let locator_path = into
        .strip_prefix(layout.root())
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| into.clone());
    ledger.upsert(
        path.clone(),
        ArtifactRecord {
            file_hash: hash,
            blueprint_id: record.blueprint_id.clone(),
            container_locator: ContainerLocator::Curated(locator_path),
        },
    );
    ledger::save_at(&layout.ledger_path(), ledger)?;

    tracing::info!(path = %path.display(), into = %into.display(), "transferred definition");
    Ok(TransferOutcome {
        path,
        id: record.blueprint_id,
        from,
        into,
    })
}

// ---------------------------------------------------------------------------
// Id derivation
// ---------------------------------------------------------------------------

/// Artifact tracked in `container` under `id`, if any.
fn owner_of(layout: &Layout, ledger: &Ledger, container: &Path, id: &BlueprintId) -> Option<PathBuf> {
    ledger
        .iter()
        .find(|(path, record)| {
            record.blueprint_id == *id
                && layout.container_path(path, &record.container_locator) == container
        })
        .map(|(path, _)| path.clone())
}

/// `<stem>_blueprint`, falling back to `<stem>_<ext>_blueprint` and then a
/// numeric suffix when the id is owned by another artifact or already
/// defined, untracked, in the container.
fn derive_id(layout: &Layout, ledger: &Ledger, path: &Path, container: &Container) -> BlueprintId {
    let stem = ident(
        &path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    let ext = path
        .extension()
        .map(|e| ident(&e.to_string_lossy()))
        .filter(|e| !e.is_empty());

    let free = |candidate: &BlueprintId| {
        match owner_of(layout, ledger, container.path(), candidate) {
            Some(owner) => owner == path,
            None => !container.contains(candidate),
        }
    };

    let base = BlueprintId(format!("{stem}_blueprint"));
    if free(&base) {
        return base;
    }
    let qualified = match &ext {
        Some(ext) => format!("{stem}_{ext}"),
        None => stem.clone(),
    };
    let with_ext = BlueprintId(format!("{qualified}_blueprint"));
    if free(&with_ext) {
        return with_ext;
    }
    (2..)
        .map(|n| BlueprintId(format!("{qualified}_{n}_blueprint")))
        .find(|candidate| free(candidate))
        .unwrap_or(with_ext)
}

/// Map a file-name fragment onto `[A-Za-z_][A-Za-z0-9_]*`.
fn ident(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
