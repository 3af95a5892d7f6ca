//! Command registry — an aggregate JSON document rebuilt from descriptor
//! fragments embedded in per-command artifacts.
//!
//! A per-command artifact carries a dictionary-style definition named by the
//! configured descriptor symbol whose body is a JSON object:
//!
//! ```text
//! commandJsonDict = {
//!     "deploy": {"description": "Ship it", "flags": {"--dry": {"type": "bool"}}}
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use stencil_blueprint::{extract, BlueprintError, BodyStyle};
use stencil_core::Layout;

use crate::error::{io_err, malformed, ErrorKind, SyncError};

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEntry {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, serde_json::Value>,
    /// Fields stencil does not interpret, carried through unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Command name → entry. Keys serialize in sorted order.
pub type RegistryDocument = BTreeMap<String, CommandEntry>;

/// Descriptor content of one per-command artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub source: PathBuf,
    pub commands: RegistryDocument,
}

/// A per-command artifact that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub reason: String,
}

impl ScanIssue {
    fn new(path: &Path, err: SyncError) -> Self {
        tracing::warn!(path = %path.display(), error = %err, "skipping descriptor");
        Self {
            path: path.to_path_buf(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    pub document: RegistryDocument,
    pub fragments: usize,
    /// Aggregate entries kept although no artifact describes them.
    pub preserved: Vec<String>,
    pub issues: Vec<ScanIssue>,
}

/// Disagreement between a source fragment and the live aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    MissingSection {
        command: String,
        source: PathBuf,
    },
    DescriptionMismatch {
        command: String,
        source: PathBuf,
        expected: String,
        found: String,
    },
    CountMismatch {
        command: String,
        source: PathBuf,
        field: &'static str,
        expected: usize,
        found: usize,
    },
    OrphanEntry {
        command: String,
    },
}

impl Drift {
    pub fn command(&self) -> &str {
        match self {
            Drift::MissingSection { command, .. }
            | Drift::DescriptionMismatch { command, .. }
            | Drift::CountMismatch { command, .. }
            | Drift::OrphanEntry { command } => command,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    pub drifts: Vec<Drift>,
    pub issues: Vec<ScanIssue>,
    pub checked: usize,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.drifts.is_empty() && self.issues.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Parse the descriptor fragments of every per-command artifact.
///
/// Artifacts that mention the descriptor symbol without defining it are
/// ignored; unreadable or malformed ones become issues.
pub fn scan_fragments(layout: &Layout) -> Result<(Vec<Fragment>, Vec<ScanIssue>), SyncError> {
    let dir = layout.commands_dir();
    let symbol = layout.config().descriptor_symbol.as_str();
    let mut fragments = Vec::new();
    let mut issues = Vec::new();

    let read_dir = match std::fs::read_dir(&dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok((fragments, issues)),
        Err(e) => return Err(io_err(&dir, e)),
    };
    let mut paths = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| io_err(&dir, e))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.path().is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    for path in paths {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                issues.push(ScanIssue::new(&path, io_err(&path, e)));
                continue;
            }
        };
        if !text.contains(symbol) {
            continue;
        }
        match parse_descriptor(&path, &text, symbol) {
            Ok(Some(commands)) => fragments.push(Fragment {
                source: path,
                commands,
            }),
            Ok(None) => {}
            Err(err) => issues.push(ScanIssue::new(&path, err)),
        }
    }
    Ok((fragments, issues))
}

fn parse_descriptor(
    path: &Path,
    text: &str,
    symbol: &str,
) -> Result<Option<RegistryDocument>, SyncError> {
    let span = match extract(text, symbol) {
        Ok(span) => span,
        Err(BlueprintError::NotFound { .. }) => return Ok(None),
        Err(err) => return Err(malformed(path, err)),
    };
    if span.style != BodyStyle::Dict {
        return Err(SyncError::MalformedDescriptor {
            path: path.to_path_buf(),
            id: symbol.to_string(),
            detail: "descriptor must be a dictionary".to_string(),
        });
    }
    serde_json::from_str(span.body_text(text))
        .map(Some)
        .map_err(|e| SyncError::MalformedDescriptor {
            path: path.to_path_buf(),
            id: symbol.to_string(),
            detail: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Aggregate I/O
// ---------------------------------------------------------------------------

/// Load the live aggregate; a missing file is an empty document.
pub fn load_aggregate(path: &Path) -> Result<RegistryDocument, SyncError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(RegistryDocument::new()),
        Err(e) => return Err(io_err(path, e)),
    };
    serde_json::from_str(&text).map_err(|source| SyncError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the aggregate atomically as pretty JSON with a trailing newline.
pub fn save_aggregate(path: &Path, document: &RegistryDocument) -> Result<(), SyncError> {
    let mut json = serde_json::to_string_pretty(document).map_err(|source| SyncError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Merge every fragment over the live aggregate. Later fragments win on key
/// collision; aggregate entries with no source are kept. Writes nothing.
pub fn build_from_source(layout: &Layout) -> Result<BuildResult, SyncError> {
    let mut document = load_aggregate(&layout.registry_path())?;
    let (fragments, issues) = scan_fragments(layout)?;

    let mut sourced = BTreeSet::new();
    for fragment in &fragments {
        for (name, entry) in &fragment.commands {
            sourced.insert(name.clone());
            document.insert(name.clone(), entry.clone());
        }
    }
    let preserved = document
        .keys()
        .filter(|name| !sourced.contains(*name))
        .cloned()
        .collect();

    Ok(BuildResult {
        document,
        fragments: fragments.len(),
        preserved,
        issues,
    })
}

/// Compare the sources against the live aggregate. Reports only; the
/// aggregate is never modified.
pub fn verify(layout: &Layout) -> Result<VerifyReport, SyncError> {
    let aggregate = load_aggregate(&layout.registry_path())?;
    let (fragments, issues) = scan_fragments(layout)?;

    let mut sources: BTreeMap<&str, (&Path, &CommandEntry)> = BTreeMap::new();
    for fragment in &fragments {
        for (name, entry) in &fragment.commands {
            sources.insert(name.as_str(), (fragment.source.as_path(), entry));
        }
    }

    let mut drifts = Vec::new();
    for (&name, &(source, expected)) in &sources {
        let Some(found) = aggregate.get(name) else {
            drifts.push(Drift::MissingSection {
                command: name.to_string(),
                source: source.to_path_buf(),
            });
            continue;
        };
        if found.description != expected.description {
            drifts.push(Drift::DescriptionMismatch {
                command: name.to_string(),
                source: source.to_path_buf(),
                expected: expected.description.clone(),
                found: found.description.clone(),
            });
        }
        let counts = [
            ("flags", expected.flags.len(), found.flags.len()),
            ("arguments", expected.arguments.len(), found.arguments.len()),
        ];
        for (field, want, have) in counts {
            if want != have {
                drifts.push(Drift::CountMismatch {
                    command: name.to_string(),
                    source: source.to_path_buf(),
                    field,
                    expected: want,
                    found: have,
                });
            }
        }
    }
    for name in aggregate.keys() {
        if !sources.contains_key(name.as_str()) {
            drifts.push(Drift::OrphanEntry {
                command: name.clone(),
            });
        }
    }

    Ok(VerifyReport {
        drifts,
        issues,
        checked: sources.len(),
    })
}

/// [`build_from_source`] and persist the result.
pub fn repair(layout: &Layout) -> Result<BuildResult, SyncError> {
    let result = build_from_source(layout)?;
    let path = layout.registry_path();
    save_aggregate(&path, &result.document)?;
    tracing::info!(path = %path.display(), commands = result.document.len(), "registry written");
    Ok(result)
}
