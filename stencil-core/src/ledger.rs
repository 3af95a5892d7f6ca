//! Sync ledger — the persisted tracking table.
//!
//! # On-disk format
//!
//! ```text
//! {
//!   "_parameters": { "packName": "demo", "version": "0.1.0" },
//!   "/abs/path/to/artifact": {
//!     "fileHash": "<sha256 hex>",
//!     "blueprintId": "check_blueprint",
//!     "containerLocator": "newMakeTemplate"
//!   }
//! }
//! ```
//!
//! The ledger is loaded once at the start of an invocation and saved once at
//! the end. Writes use the `.tmp` + rename pattern, so a failed save leaves
//! the previous ledger in place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::types::{ArtifactRecord, ParameterSet};

/// Reserved ledger key holding the project's [`ParameterSet`].
pub const PARAMETERS_KEY: &str = "_parameters";

/// In-memory ledger: the parameter set plus one record per tracked artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub parameters: ParameterSet,
    records: BTreeMap<PathBuf, ArtifactRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(rename = "_parameters", default)]
    parameters: ParameterSet,
    #[serde(flatten)]
    records: BTreeMap<String, ArtifactRecord>,
}

impl Ledger {
    pub fn new(parameters: ParameterSet) -> Self {
        Self {
            parameters,
            records: BTreeMap::new(),
        }
    }

    pub fn get(&self, path: &Path) -> Option<&ArtifactRecord> {
        self.records.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut ArtifactRecord> {
        self.records.get_mut(path)
    }

    /// Insert or replace the record for `path`, returning the previous one.
    pub fn upsert(&mut self, path: PathBuf, record: ArtifactRecord) -> Option<ArtifactRecord> {
        self.records.insert(path, record)
    }

    pub fn remove(&mut self, path: &Path) -> Option<ArtifactRecord> {
        self.records.remove(path)
    }

    /// Records in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &ArtifactRecord)> {
        self.records.iter()
    }

    /// Records tracked through `make`.
    pub fn adhoc(&self) -> impl Iterator<Item = (&PathBuf, &ArtifactRecord)> {
        self.records
            .iter()
            .filter(|(_, record)| record.container_locator.is_adhoc())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record whose artifact no longer exists on disk.
    ///
    /// Returns the number of records removed.
    pub fn prune(&mut self) -> usize {
        let before = self.records.len();
        self.records.retain(|path, _| {
            let keep = path.exists();
            if !keep {
                tracing::info!(path = %path.display(), "pruning ledger record for missing artifact");
            }
            keep
        });
        before - self.records.len()
    }
}

/// Load the ledger at `path`.
///
/// Returns an empty ledger if the file does not yet exist.
pub fn load_at(path: &Path) -> Result<Ledger, CoreError> {
    if !path.exists() {
        return Ok(Ledger::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let file: LedgerFile = serde_json::from_str(&contents).map_err(|e| CoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Ledger {
        parameters: file.parameters,
        records: file
            .records
            .into_iter()
            .map(|(key, record)| (PathBuf::from(key), record))
            .collect(),
    })
}

/// Save the ledger to `path` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`. Any failure is reported as
/// [`CoreError::Persistence`].
pub fn save_at(path: &Path, ledger: &Ledger) -> Result<(), CoreError> {
    let persistence = |source: std::io::Error| CoreError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(persistence)?;
    }

    let file = LedgerFile {
        parameters: ledger.parameters.clone(),
        records: ledger
            .records
            .iter()
            .map(|(path, record)| (path.to_string_lossy().into_owned(), record.clone()))
            .collect(),
    };
    let mut json = serde_json::to_string_pretty(&file)?;
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(persistence)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(persistence(e));
    }
    tracing::debug!(path = %path.display(), records = ledger.len(), "ledger saved");
    Ok(())
}
