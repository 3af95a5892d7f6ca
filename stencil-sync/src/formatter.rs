//! External formatter pass over written containers (`--format`).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SyncError;

/// Run `command` once per path, appending the path as the last argument.
///
/// Returns one error per container the formatter could not handle; callers
/// treat these as warnings.
pub fn format_containers(command: &[String], paths: &[PathBuf]) -> Vec<SyncError> {
    let Some((program, args)) = command.split_first() else {
        return Vec::new();
    };
    paths
        .iter()
        .filter_map(|path| run_one(program, args, path).err())
        .collect()
}

fn run_one(program: &str, args: &[String], path: &Path) -> Result<(), SyncError> {
    let failure = |detail: String| SyncError::Formatter {
        command: program.to_string(),
        path: path.to_path_buf(),
        detail,
    };
    let output = Command::new(program)
        .args(args)
        .arg(path)
        .output()
        .map_err(|e| failure(e.to_string()))?;
    if output.status.success() {
        tracing::debug!(path = %path.display(), formatter = program, "formatted container");
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(failure(format!("{}: {}", output.status, stderr.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_a_no_op() {
        assert!(format_containers(&[], &[PathBuf::from("x.py")]).is_empty());
    }

    #[test]
    fn missing_program_is_reported_per_path() {
        let cmd = vec!["stencil-no-such-formatter".to_string()];
        let errors = format_containers(&cmd, &[PathBuf::from("a.py"), PathBuf::from("b.py")]);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], SyncError::Formatter { .. }));
    }
}
