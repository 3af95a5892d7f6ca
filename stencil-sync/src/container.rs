//! Blueprint containers — source files holding named blueprint definitions.
//!
//! A [`Container`] is loaded once, edited in memory by any number of
//! [`Container::write_definition`] / [`Container::delete_definition`] calls,
//! and written back with a single [`Container::save`]. Edits only touch the
//! byte range of the definition concerned; every other definition stays
//! byte-identical.
//!
//! Saving writes `<path>.stencil.tmp` and renames it over the container. A
//! container whose last definition was deleted is removed from disk.

use std::io::ErrorKind;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::Utc;

use stencil_blueprint::{extract, BlueprintError, BodyStyle, DefinitionSpan};
use stencil_core::BlueprintId;

use crate::error::{io_err, SyncError};

/// Import required by `dedent(`-wrapped definitions.
pub const PREAMBLE: &str = "from textwrap import dedent";

const HEADER: &str = "# Blueprint container managed by stencil.\n\
# Bodies are literal artifact text; `{name}` tokens are project parameters.\n";

const STRAY_CLOSERS: [&str; 4] = ["\"\"\"", "\"\"\")", "'''", "''')"];

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Where a new definition goes when the container does not hold it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// End of the container.
    Append,
    /// After the last definition sharing the new id's blueprint class.
    AfterClass,
}

/// Outcome of [`Container::write_definition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// An existing definition was replaced.
    Replaced,
    /// The existing body already equals the new literal; nothing changed.
    Unchanged,
    /// Inserted after the last definition of the same class.
    Inserted { after: BlueprintId },
    /// Appended at the end. `ambiguous` is set when a class-based insert
    /// found no anchor and fell back to appending.
    Appended { ambiguous: bool },
}

/// Outcome of [`Container::delete_definition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Spliced,
    /// The definition was the only one; the container will be removed on save.
    ContainerRemoved,
    NotPresent,
}

/// Outcome of [`Container::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { backup: Option<PathBuf> },
    Removed { backup: Option<PathBuf> },
    Unchanged,
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Container {
    path: PathBuf,
    /// Text as last read from or written to disk; `None` when absent.
    on_disk: Option<String>,
    text: String,
    spans: Vec<DefinitionSpan>,
    corruption: Option<String>,
    remove_on_save: bool,
}

impl Container {
    /// Load the container at `path`. A missing file yields an empty container.
    ///
    /// Corrupted containers load successfully but refuse every edit.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let on_disk = match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(io_err(path, e)),
        };
        let text = on_disk.clone().unwrap_or_default();
        let (spans, corruption) = match inspect(&text) {
            Ok(spans) => (spans, None),
            Err(signature) => {
                tracing::warn!(path = %path.display(), %signature, "container failed integrity check");
                (Vec::new(), Some(signature))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            on_disk,
            text,
            spans,
            corruption,
            remove_on_save: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn exists_on_disk(&self) -> bool {
        self.on_disk.is_some()
    }

    /// Corruption signature found at load time, if any.
    pub fn corruption(&self) -> Option<&str> {
        self.corruption.as_deref()
    }

    pub fn definitions(&self) -> &[DefinitionSpan] {
        &self.spans
    }

    pub fn contains(&self, id: &BlueprintId) -> bool {
        self.position(id).is_some()
    }

    /// Literal body of `id` as stored in the container.
    pub fn literal(&self, id: &BlueprintId) -> Option<&str> {
        self.position(id).map(|idx| self.spans[idx].body_text(&self.text))
    }

    /// Whether the in-memory text differs from disk.
    pub fn is_dirty(&self) -> bool {
        match &self.on_disk {
            Some(disk) => self.remove_on_save || *disk != self.text,
            None => !self.text.is_empty(),
        }
    }

    /// Replace the body of `id`, or insert it when missing.
    ///
    /// An existing definition keeps its delimiter style; dictionary bodies
    /// are rewritten in the blueprint string style. The edit is applied to a
    /// scratch copy and committed only if the result still passes the
    /// integrity check.
    pub fn write_definition(
        &mut self,
        id: &BlueprintId,
        literal: &str,
        placement: Placement,
    ) -> Result<WriteOutcome, SyncError> {
        self.ensure_editable()?;

        if let Some(idx) = self.position(id) {
            let span = &self.spans[idx];
            let style = match span.style {
                BodyStyle::Dict => BodyStyle::BLUEPRINT,
                style => style,
            };
            if style == span.style && span.body_text(&self.text) == literal {
                return Ok(WriteOutcome::Unchanged);
            }
            let mut text = self.text.clone();
            text.replace_range(span.start..span.end, &style.render(id.as_str(), literal));
            if style.needs_preamble() {
                ensure_preamble(&mut text);
            }
            self.commit(text)?;
            return Ok(WriteOutcome::Replaced);
        }

        let rendered = BodyStyle::BLUEPRINT.render(id.as_str(), literal);
        if self.text.trim().is_empty() {
            self.commit(format!("{HEADER}{PREAMBLE}\n\n{rendered}"))?;
            self.remove_on_save = false;
            return Ok(WriteOutcome::Appended { ambiguous: false });
        }

        let mut text = self.text.clone();
        let outcome = match placement {
            Placement::Append => {
                append(&mut text, &rendered);
                WriteOutcome::Appended { ambiguous: false }
            }
            Placement::AfterClass => {
                let anchor = self
                    .spans
                    .iter()
                    .rev()
                    .find(|span| span.id.class() == id.class())
                    .map(|span| (span.id.clone(), span.end));
                match anchor {
                    Some((after, end)) => {
                        let mut insert = format!("\n{rendered}");
                        if text[end..].chars().next().is_some_and(|c| c != '\n') {
                            insert.push('\n');
                        }
                        text.insert_str(end, &insert);
                        WriteOutcome::Inserted { after }
                    }
                    None => {
                        tracing::warn!(
                            container = %self.path.display(),
                            id = %id,
                            class = id.class(),
                            "no definition of the same class; appending"
                        );
                        append(&mut text, &rendered);
                        WriteOutcome::Appended { ambiguous: true }
                    }
                }
            }
        };
        ensure_preamble(&mut text);
        self.commit(text)?;
        Ok(outcome)
    }

    /// Remove the definition of `id`.
    ///
    /// The blank lines around the removed span collapse to a single blank
    /// line. Deleting the only definition marks the container for removal.
    pub fn delete_definition(&mut self, id: &BlueprintId) -> Result<DeleteOutcome, SyncError> {
        self.ensure_editable()?;
        let Some(idx) = self.position(id) else {
            return Ok(DeleteOutcome::NotPresent);
        };
        if self.spans.len() == 1 {
            self.text.clear();
            self.spans.clear();
            self.remove_on_save = true;
            return Ok(DeleteOutcome::ContainerRemoved);
        }
        let (start, end) = (self.spans[idx].start, self.spans[idx].end);
        let mut text = self.text.clone();
        text.replace_range(start..end, "");
        collapse_blank_run(&mut text, start);
        self.commit(text)?;
        Ok(DeleteOutcome::Spliced)
    }

    /// Write pending edits to disk, optionally copying the previous version
    /// into `backup_dir` first. A clean container is left untouched.
    pub fn save(&mut self, backup_dir: Option<&Path>) -> Result<SaveOutcome, SyncError> {
        if !self.is_dirty() {
            return Ok(SaveOutcome::Unchanged);
        }
        let backup = match (backup_dir, self.on_disk.is_some()) {
            (Some(dir), true) => Some(backup(&self.path, dir)?),
            _ => None,
        };

        if self.remove_on_save && self.text.is_empty() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(&self.path, e)),
            }
            self.on_disk = None;
            self.remove_on_save = false;
            tracing::info!(path = %self.path.display(), "removed empty container");
            return Ok(SaveOutcome::Removed { backup });
        }

        atomic_write(&self.path, &self.text)?;
        self.on_disk = Some(self.text.clone());
        self.remove_on_save = false;
        tracing::info!(path = %self.path.display(), "wrote container");
        Ok(SaveOutcome::Written { backup })
    }

    fn position(&self, id: &BlueprintId) -> Option<usize> {
        self.spans.iter().position(|span| span.id == *id)
    }

    fn ensure_editable(&self) -> Result<(), SyncError> {
        match &self.corruption {
            Some(signature) => Err(SyncError::CorruptedContainer {
                path: self.path.clone(),
                signature: signature.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Adopt `text` if it passes the integrity check. On failure the
    /// container keeps its previous text and spans.
    fn commit(&mut self, text: String) -> Result<(), SyncError> {
        let spans = inspect(&text).map_err(|signature| SyncError::CorruptedContainer {
            path: self.path.clone(),
            signature,
        })?;
        self.text = text;
        self.spans = spans;
        Ok(())
    }
}

fn append(text: &mut String, rendered: &str) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    if !text.ends_with("\n\n") {
        text.push('\n');
    }
    text.push_str(rendered);
}

/// Insert the `dedent` import after any leading comment lines.
fn ensure_preamble(text: &mut String) {
    if text.lines().any(|line| line.trim_end() == PREAMBLE) {
        return;
    }
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if !line.starts_with('#') {
            break;
        }
        offset += line.len();
    }
    let mut insert = format!("{PREAMBLE}\n");
    if !text[offset..].starts_with('\n') {
        insert.push('\n');
    }
    text.insert_str(offset, &insert);
}

// ---------------------------------------------------------------------------
// Path-level helpers
// ---------------------------------------------------------------------------

/// Ids and body ranges of every definition in the container at `path`.
pub fn read_definitions(path: &Path) -> Result<Vec<(BlueprintId, Range<usize>)>, SyncError> {
    let container = Container::load(path)?;
    container.ensure_editable()?;
    Ok(container
        .spans
        .into_iter()
        .map(|span| (span.id, span.body))
        .collect())
}

/// Load, write one definition, and save.
pub fn write_definition(
    path: &Path,
    id: &BlueprintId,
    literal: &str,
    placement: Placement,
    backup_dir: Option<&Path>,
) -> Result<WriteOutcome, SyncError> {
    let mut container = Container::load(path)?;
    let outcome = container.write_definition(id, literal, placement)?;
    container.save(backup_dir)?;
    Ok(outcome)
}

/// Load, delete one definition, and save.
pub fn delete_definition(
    path: &Path,
    id: &BlueprintId,
    backup_dir: Option<&Path>,
) -> Result<DeleteOutcome, SyncError> {
    let mut container = Container::load(path)?;
    let outcome = container.delete_definition(id)?;
    container.save(backup_dir)?;
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

/// Scan `text` and check it for known corruption signatures.
fn inspect(text: &str) -> Result<Vec<DefinitionSpan>, String> {
    let spans = extract::scan(text).map_err(|err| match err {
        BlueprintError::Unterminated { id, line } => {
            format!("definition '{id}' opened on line {line} is never closed")
        }
        other => other.to_string(),
    })?;

    for (i, span) in spans.iter().enumerate() {
        if let Some(dup) = spans[i + 1..].iter().find(|s| s.id == span.id) {
            return Err(format!(
                "duplicate definition '{}' on lines {} and {}",
                span.id, span.line, dup.line
            ));
        }
    }

    let mut offset = 0;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let inside = spans.iter().any(|s| offset >= s.start && offset < s.end);
        if !inside && STRAY_CLOSERS.contains(&line.trim_end()) {
            return Err(format!("stray closing delimiter on line {}", idx + 1));
        }
        offset += line.len();
    }
    Ok(spans)
}

/// Collapse the run of newlines around `at` to one blank line, or to a single
/// trailing newline at end of file.
fn collapse_blank_run(text: &mut String, at: usize) {
    let bytes = text.as_bytes();
    let mut from = at;
    while from > 0 && bytes[from - 1] == b'\n' {
        from -= 1;
    }
    let mut to = at;
    while to < bytes.len() && bytes[to] == b'\n' {
        to += 1;
    }
    let replacement = if from == 0 {
        ""
    } else if to == bytes.len() {
        "\n"
    } else if to - from > 2 {
        "\n\n"
    } else {
        return;
    };
    text.replace_range(from..to, replacement);
}

fn atomic_write(path: &Path, content: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.stencil.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn backup(path: &Path, dir: &Path) -> Result<PathBuf, SyncError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "container".to_string());
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let target = dir.join(format!("{name}.{stamp}.bak"));
    std::fs::copy(path, &target).map_err(|e| io_err(&target, e))?;
    tracing::debug!(from = %path.display(), to = %target.display(), "container backed up");
    Ok(target)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn id(s: &str) -> BlueprintId {
        BlueprintId::from(s)
    }

    fn seeded(tmp: &TempDir, text: &str) -> PathBuf {
        let path = tmp.path().join("blueprints.py");
        fs::write(&path, text).unwrap();
        path
    }

    const CURATED: &str = "\
from textwrap import dedent

help_cmd = dedent(\"\"\"\\
print(\"help\")
\"\"\")

list_cmd = dedent(\"\"\"\\
print(\"list\")
\"\"\")

setup_cfg = dedent(\"\"\"\\
[metadata]
\"\"\")
";

    #[test]
    fn first_write_creates_container_with_header_and_preamble() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("adhoc").join("root.py");
        let outcome = write_definition(&path, &id("a_blueprint"), "x = 1\n", Placement::Append, None)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Appended { ambiguous: false });

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Blueprint container managed by stencil."));
        assert!(text.contains(&format!("{PREAMBLE}\n\na_blueprint = dedent(\"\"\"\\\nx = 1\n\"\"\")\n")));
        assert!(!PathBuf::from(format!("{}.stencil.tmp", path.display())).exists());
    }

    #[test]
    fn replace_touches_only_the_target_span() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        let mut c = Container::load(&path).unwrap();
        let before_setup = c.definitions()[2].text(c.text()).to_string();

        let outcome = c
            .write_definition(&id("list_cmd"), "print(\"ls\")\n", Placement::AfterClass)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Replaced);
        assert_eq!(c.literal(&id("list_cmd")), Some("print(\"ls\")\n"));
        assert_eq!(c.definitions()[2].text(c.text()), before_setup);
        assert_eq!(c.text(), CURATED.replace("print(\"list\")", "print(\"ls\")"));
    }

    #[test]
    fn identical_literal_is_unchanged_and_not_saved() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        let mut c = Container::load(&path).unwrap();
        let outcome = c
            .write_definition(&id("help_cmd"), "print(\"help\")\n", Placement::AfterClass)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert!(!c.is_dirty());
        assert_eq!(c.save(None).unwrap(), SaveOutcome::Unchanged);
    }

    #[test]
    fn after_class_inserts_behind_last_sibling() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        let mut c = Container::load(&path).unwrap();
        let outcome = c
            .write_definition(&id("init_cmd"), "print(\"init\")\n", Placement::AfterClass)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Inserted { after: id("list_cmd") });
        let order: Vec<&str> = c.definitions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, ["help_cmd", "list_cmd", "init_cmd", "setup_cfg"]);
        assert!(c.text().contains("\"\"\")\n\ninit_cmd = dedent("));
        assert!(c.text().contains("print(\"init\")\n\"\"\")\n\nsetup_cfg"));
    }

    #[test]
    fn after_class_without_sibling_appends_and_flags_ambiguity() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        let mut c = Container::load(&path).unwrap();
        let outcome = c
            .write_definition(&id("readme_md"), "# demo\n", Placement::AfterClass)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Appended { ambiguous: true });
        assert_eq!(c.definitions().last().unwrap().id, id("readme_md"));
    }

    #[test]
    fn delete_splices_and_collapses_blank_lines() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        let outcome = delete_definition(&path, &id("list_cmd"), None).unwrap();
        assert_eq!(outcome, DeleteOutcome::Spliced);
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("list_cmd"));
        assert!(text.contains("\"\"\")\n\nsetup_cfg"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn delete_last_definition_in_file_keeps_single_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        delete_definition(&path, &id("setup_cfg"), None).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("print(\"list\")\n\"\"\")\n"));
    }

    #[test]
    fn deleting_only_definition_removes_container() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("solo.py");
        write_definition(&path, &id("only_blueprint"), "x\n", Placement::Append, None).unwrap();
        assert!(path.exists());
        let outcome = delete_definition(&path, &id("only_blueprint"), None).unwrap();
        assert_eq!(outcome, DeleteOutcome::ContainerRemoved);
        assert!(!path.exists());
    }

    #[test]
    fn delete_missing_definition_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        assert_eq!(
            delete_definition(&path, &id("nope"), None).unwrap(),
            DeleteOutcome::NotPresent
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), CURATED);
    }

    #[test]
    fn single_quote_style_is_preserved_on_replace() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, "note_txt = '''hello'''\n");
        write_definition(&path, &id("note_txt"), "bye", Placement::Append, None).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "note_txt = '''bye'''\n");
    }

    #[test]
    fn corrupted_containers_are_never_edited() {
        let cases = [
            "a_x = dedent(\"\"\"\\\nnever closed\n",
            "a_x = \"\"\"one\"\"\"\na_x = \"\"\"two\"\"\"\n",
            "a_x = \"\"\"one\"\"\"\n\"\"\")\n",
        ];
        for case in cases {
            let tmp = TempDir::new().unwrap();
            let path = seeded(&tmp, case);
            let err = write_definition(&path, &id("b_x"), "y", Placement::Append, None).unwrap_err();
            assert!(
                matches!(err, SyncError::CorruptedContainer { .. }),
                "expected corruption for {case:?}, got {err:?}"
            );
            assert_eq!(fs::read_to_string(&path).unwrap(), case);
        }
    }

    #[test]
    fn backup_is_taken_before_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        let backups = tmp.path().join("backups");
        let mut c = Container::load(&path).unwrap();
        c.write_definition(&id("help_cmd"), "print(\"?\")\n", Placement::AfterClass)
            .unwrap();
        let SaveOutcome::Written { backup: Some(copy) } = c.save(Some(&backups)).unwrap() else {
            panic!("expected a backup");
        };
        assert!(copy.starts_with(&backups));
        assert!(copy.to_string_lossy().ends_with(".bak"));
        assert_eq!(fs::read_to_string(copy).unwrap(), CURATED);
    }

    #[test]
    fn preamble_goes_after_leading_comments() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, "# curated\nx_cfg = {\"a\": 1}\n");
        write_definition(&path, &id("y_cfg"), "b", Placement::AfterClass, None).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# curated\nfrom textwrap import dedent\n\nx_cfg = {\"a\": 1}\n"));
        assert!(text.ends_with("y_cfg = dedent(\"\"\"\\\nb\"\"\")\n"));
    }

    #[test]
    fn read_definitions_lists_ids_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        let ids: Vec<String> = read_definitions(&path)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id.0)
            .collect();
        assert_eq!(ids, ["help_cmd", "list_cmd", "setup_cfg"]);
    }

    #[test]
    fn rejected_edit_leaves_container_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = seeded(&tmp, CURATED);
        let mut c = Container::load(&path).unwrap();

        // Unescaped delimiters would leave a stray closer behind.
        let err = c
            .write_definition(&id("list_cmd"), "oops \"\"\")\nstray\n\"\"\"\n", Placement::Append)
            .unwrap_err();
        assert!(matches!(err, SyncError::CorruptedContainer { .. }));
        assert_eq!(c.text(), CURATED);
        assert!(!c.is_dirty());
        assert_eq!(c.definitions().len(), 3);

        c.write_definition(&id("list_cmd"), "print(\"ls\")\n", Placement::Append)
            .unwrap();
        c.save(None).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stray"));
        assert!(text.contains("print(\"ls\")"));
    }

    #[test]
    fn multi_byte_bodies_are_edited_in_place() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("root.py");
        write_definition(&path, &id("a_blueprint"), "# café ✓\nx = \"é\"\n", Placement::Append, None)
            .unwrap();
        write_definition(&path, &id("b_blueprint"), "# naïve — ok\n", Placement::AfterClass, None)
            .unwrap();

        let mut c = Container::load(&path).unwrap();
        assert!(c.corruption().is_none());
        assert_eq!(c.literal(&id("a_blueprint")), Some("# café ✓\nx = \"é\"\n"));
        let outcome = c
            .write_definition(&id("a_blueprint"), "# crème brûlée\n", Placement::Append)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Replaced);
        assert_eq!(c.literal(&id("b_blueprint")), Some("# naïve — ok\n"));
    }
}
