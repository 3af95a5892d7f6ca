//! Project configuration and path layout.
//!
//! Configuration lives at `<root>/.stencil/config.yaml`. Every field is
//! optional; a missing file yields [`StencilConfig::default`].
//!
//! ```yaml
//! ledger: .stencil/ledger.json
//! adhoc_dir: .stencil/templates
//! backup_dir: .stencil/backups
//! commands_dir: src/commands
//! descriptor_symbol: commandJsonDict
//! registry_file: commands.json
//! curated_container: templates/blueprints.py
//! formatter: [black, -q]
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::types::ContainerLocator;

/// Config file location relative to the project root.
pub const CONFIG_FILE: &str = ".stencil/config.yaml";

/// User-tunable settings for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StencilConfig {
    pub ledger: PathBuf,
    /// Directory holding containers for `make`-tracked artifacts.
    pub adhoc_dir: PathBuf,
    pub backup_dir: PathBuf,
    /// Directory scanned for per-command descriptor fragments.
    pub commands_dir: PathBuf,
    pub descriptor_symbol: String,
    pub registry_file: PathBuf,
    /// Default target container for `tmpl trans`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curated_container: Option<PathBuf>,
    /// External formatter command run over written containers on request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<Vec<String>>,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            ledger: PathBuf::from(".stencil/ledger.json"),
            adhoc_dir: PathBuf::from(".stencil/templates"),
            backup_dir: PathBuf::from(".stencil/backups"),
            commands_dir: PathBuf::from("src/commands"),
            descriptor_symbol: "commandJsonDict".to_string(),
            registry_file: PathBuf::from("commands.json"),
            curated_container: None,
            formatter: None,
        }
    }
}

/// Load `<root>/.stencil/config.yaml`, falling back to defaults when absent.
pub fn load_at(root: &Path) -> Result<StencilConfig, CoreError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(StencilConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(StencilConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Config { path, source: e })
}

/// Write the default config to `<root>/.stencil/config.yaml` unless one exists.
///
/// Returns `true` when a file was created.
pub fn write_default_at(root: &Path) -> Result<bool, CoreError> {
    let path = root.join(CONFIG_FILE);
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let yaml = serde_yaml::to_string(&StencilConfig::default())
        .map_err(|e| CoreError::Config {
            path: path.clone(),
            source: e,
        })?;
    std::fs::write(&path, yaml).map_err(|e| io_err(&path, e))?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Resolved filesystem layout of one project.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    config: StencilConfig,
}

impl Layout {
    /// Canonicalize `root` and load its config.
    pub fn discover(root: &Path) -> Result<Self, CoreError> {
        let root = root.canonicalize().map_err(|e| io_err(root, e))?;
        let config = load_at(&root)?;
        Ok(Self { root, config })
    }

    pub fn new(root: PathBuf, config: StencilConfig) -> Self {
        Self { root, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &StencilConfig {
        &self.config
    }

    /// Join `path` onto the root unless it is already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.resolve(&self.config.ledger)
    }

    pub fn adhoc_dir(&self) -> PathBuf {
        self.resolve(&self.config.adhoc_dir)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.resolve(&self.config.backup_dir)
    }

    pub fn commands_dir(&self) -> PathBuf {
        self.resolve(&self.config.commands_dir)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.resolve(&self.config.registry_file)
    }

    pub fn curated_container(&self) -> Option<PathBuf> {
        self.config.curated_container.as_deref().map(|p| self.resolve(p))
    }

    /// Absolute ledger key for a user-supplied artifact path.
    ///
    /// Existing files are canonicalized; missing ones are normalized lexically
    /// so records for deleted artifacts can still be addressed.
    pub fn artifact_path(&self, path: &Path) -> PathBuf {
        let joined = self.resolve(path);
        joined
            .canonicalize()
            .unwrap_or_else(|_| normalize_lexically(&joined))
    }

    /// Container holding the `make`-tracked definition of `artifact`.
    ///
    /// Artifacts in the same directory share one container.
    pub fn adhoc_container_for(&self, artifact: &Path) -> PathBuf {
        let parent = artifact.parent().unwrap_or_else(|| Path::new(""));
        let relative = parent.strip_prefix(&self.root).unwrap_or(parent);
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(sanitize(&s.to_string_lossy())),
                _ => None,
            })
            .collect();
        let slug = if segments.is_empty() {
            "root".to_string()
        } else {
            segments.join("_")
        };
        self.adhoc_dir().join(format!("{slug}.py"))
    }

    /// Container path for a record, whichever kind of locator it carries.
    pub fn container_path(&self, artifact: &Path, locator: &ContainerLocator) -> PathBuf {
        locator
            .curated_path(&self.root)
            .unwrap_or_else(|| self.adhoc_container_for(artifact))
    }

    /// Path shown to users: relative to the root when possible.
    pub fn display_path<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
