pub mod init;
pub mod output;
pub mod registry;
pub mod sync;
pub mod tmpl;

use std::path::Path;

use anyhow::{Context, Result};
use stencil_core::{ledger, Layout, Ledger};

/// Layout and ledger loaded once per invocation.
pub struct Project {
    pub layout: Layout,
    pub ledger: Ledger,
}

impl Project {
    pub fn open(root: &Path) -> Result<Self> {
        let layout = Layout::discover(root)
            .with_context(|| format!("cannot open project at '{}'", root.display()))?;
        let ledger_path = layout.ledger_path();
        let ledger = ledger::load_at(&ledger_path)
            .with_context(|| format!("failed to load ledger '{}'", ledger_path.display()))?;
        tracing::debug!(root = %layout.root().display(), records = ledger.len(), "project opened");
        Ok(Self { layout, ledger })
    }

    /// Root-relative path for display.
    pub fn rel(&self, path: &Path) -> String {
        self.layout.display_path(path).display().to_string()
    }
}
