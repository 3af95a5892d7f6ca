//! Domain types shared by every stencil crate.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Ledger value of `containerLocator` marking an artifact tracked through `make`.
pub const ADHOC_SENTINEL: &str = "newMakeTemplate";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a blueprint definition inside a container.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlueprintId(pub String);

impl BlueprintId {
    /// Whether `name` can be used as a definition name (`[A-Za-z_][A-Za-z0-9_]*`).
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Blueprint class used for positional inserts.
    ///
    /// The last `_`-separated segment (`help_cmd` → `cmd`), or the last
    /// camel-case hump when there is no underscore (`helpCmd` → `Cmd`).
    pub fn class(&self) -> &str {
        let id = self.0.as_str();
        if let Some(idx) = id.rfind('_') {
            if idx + 1 < id.len() {
                return &id[idx + 1..];
            }
        }
        match id.char_indices().rev().find(|(_, c)| c.is_ascii_uppercase()) {
            Some((idx, _)) if idx > 0 => &id[idx..],
            _ => id,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BlueprintId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BlueprintId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Lowercase hex SHA-256 digest of an artifact's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ContentHash {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Concrete parameter values (package name, version, ...) a project was
/// instantiated with. One per project; read-only for the length of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ---------------------------------------------------------------------------
// Tracking records
// ---------------------------------------------------------------------------

/// Where an artifact's blueprint lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerLocator {
    /// Tracked via `make`; the container path is derived from the artifact path.
    AdHoc,
    /// A curated container file. Relative paths resolve against the project root.
    Curated(PathBuf),
}

impl ContainerLocator {
    pub fn is_adhoc(&self) -> bool {
        matches!(self, ContainerLocator::AdHoc)
    }

    /// Curated container path resolved against `root`; `None` for ad-hoc.
    pub fn curated_path(&self, root: &Path) -> Option<PathBuf> {
        match self {
            ContainerLocator::AdHoc => None,
            ContainerLocator::Curated(path) if path.is_absolute() => Some(path.clone()),
            ContainerLocator::Curated(path) => Some(root.join(path)),
        }
    }
}

impl From<String> for ContainerLocator {
    fn from(s: String) -> Self {
        if s == ADHOC_SENTINEL {
            ContainerLocator::AdHoc
        } else {
            ContainerLocator::Curated(PathBuf::from(s))
        }
    }
}

impl From<ContainerLocator> for String {
    fn from(locator: ContainerLocator) -> Self {
        match locator {
            ContainerLocator::AdHoc => ADHOC_SENTINEL.to_string(),
            ContainerLocator::Curated(path) => path.to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Display for ContainerLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerLocator::AdHoc => f.write_str(ADHOC_SENTINEL),
            ContainerLocator::Curated(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Ledger entry for a single tracked artifact. The artifact path is the ledger key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Hash of the artifact as of the last successful sync.
    pub file_hash: ContentHash,
    pub blueprint_id: BlueprintId,
    pub container_locator: ContainerLocator,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blueprint_class_uses_last_segment() {
        assert_eq!(BlueprintId::from("help_cmd").class(), "cmd");
        assert_eq!(BlueprintId::from("check_blueprint").class(), "blueprint");
        assert_eq!(BlueprintId::from("helpCmd").class(), "Cmd");
        assert_eq!(BlueprintId::from("setup").class(), "setup");
        assert_eq!(BlueprintId::from("Setup").class(), "Setup");
    }

    #[test]
    fn blueprint_id_validity() {
        assert!(BlueprintId::is_valid("check_blueprint"));
        assert!(BlueprintId::is_valid("_x1"));
        assert!(!BlueprintId::is_valid("1x"));
        assert!(!BlueprintId::is_valid("a-b"));
        assert!(!BlueprintId::is_valid(""));
    }

    #[test]
    fn locator_serializes_adhoc_as_sentinel() {
        let json = serde_json::to_string(&ContainerLocator::AdHoc).unwrap();
        assert_eq!(json, "\"newMakeTemplate\"");
        let curated: ContainerLocator = serde_json::from_str("\"templates/cmd.py\"").unwrap();
        assert_eq!(curated, ContainerLocator::Curated(PathBuf::from("templates/cmd.py")));
    }

    #[test]
    fn curated_path_resolves_relative_to_root() {
        let root = Path::new("/work/proj");
        let rel = ContainerLocator::Curated(PathBuf::from("templates/cmd.py"));
        assert_eq!(rel.curated_path(root), Some(PathBuf::from("/work/proj/templates/cmd.py")));
        assert_eq!(ContainerLocator::AdHoc.curated_path(root), None);
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let record = ArtifactRecord {
            file_hash: ContentHash::from("abc"),
            blueprint_id: BlueprintId::from("check_blueprint"),
            container_locator: ContainerLocator::AdHoc,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["fileHash"], "abc");
        assert_eq!(value["blueprintId"], "check_blueprint");
        assert_eq!(value["containerLocator"], "newMakeTemplate");
    }
}
