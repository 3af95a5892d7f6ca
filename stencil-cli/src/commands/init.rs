//! `stencil init --param KEY=VALUE...`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use stencil_core::{config, ledger};

use super::Project;

/// Record project parameters in the ledger.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Parameter used when literalizing artifacts, e.g. `packName=acme`.
    /// Repeat for several parameters; existing values are overwritten.
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl InitArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let root = root
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", root.display()))?;
        let created = config::write_default_at(&root)
            .with_context(|| format!("failed to write config under '{}'", root.display()))?;

        let mut project = Project::open(&root)?;
        for (key, value) in self.params {
            project.ledger.parameters.insert(key, value);
        }
        let ledger_path = project.layout.ledger_path();
        ledger::save_at(&ledger_path, &project.ledger)
            .with_context(|| format!("failed to save ledger '{}'", ledger_path.display()))?;

        if created {
            println!("✓ Wrote {}", config::CONFIG_FILE);
        }
        println!(
            "✓ Saved {} parameter(s) to {}",
            project.ledger.parameters.len(),
            project.rel(&ledger_path)
        );
        for (key, value) in project.ledger.parameters.iter() {
            println!("  {key} = {value}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_split_on_first_equals() {
        assert_eq!(
            parse_param("url=https://x?a=b").unwrap(),
            ("url".to_string(), "https://x?a=b".to_string())
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=v").is_err());
    }
}
