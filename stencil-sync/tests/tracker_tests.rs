use std::fs;
use std::path::PathBuf;

use stencil_core::{ledger, ArtifactRecord, BlueprintId, ContainerLocator, Layout, Ledger, StencilConfig};
use stencil_sync::{container::Container, hasher, tracker, SyncError};
use tempfile::TempDir;

const CURATED: &str = "\
from textwrap import dedent

help_cmd = dedent(\"\"\"\\
print(\"help\")
\"\"\")

setup_cfg = dedent(\"\"\"\\
[metadata]
\"\"\")
";

fn project() -> (TempDir, Layout, Ledger) {
    let tmp = TempDir::new().expect("root");
    let layout = Layout::new(tmp.path().canonicalize().unwrap(), StencilConfig::default());
    (tmp, layout, Ledger::default())
}

fn curated_record(layout: &Layout, ledger: &mut Ledger, file: &str, id: &str) -> PathBuf {
    let path = layout.root().join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "print(\"help\")\n").unwrap();
    ledger.upsert(
        path.clone(),
        ArtifactRecord {
            file_hash: hasher::hash_file(&path).unwrap(),
            blueprint_id: BlueprintId::from(id),
            container_locator: ContainerLocator::Curated(PathBuf::from("templates/blueprints.py")),
        },
    );
    path
}

#[test]
fn rm_temp_refuses_curated_records_and_mutates_nothing() {
    let (_tmp, layout, mut ledger) = project();
    let curated = layout.root().join("templates/blueprints.py");
    fs::create_dir_all(curated.parent().unwrap()).unwrap();
    fs::write(&curated, CURATED).unwrap();
    let help = curated_record(&layout, &mut ledger, "src/help.py", "help_cmd");
    ledger::save_at(&layout.ledger_path(), &ledger).unwrap();
    let ledger_before = fs::read_to_string(layout.ledger_path()).unwrap();

    let err = tracker::rm_temp(&layout, &mut ledger, &help, false).unwrap_err();
    assert!(matches!(err, SyncError::NotAuthorized { .. }));
    assert!(ledger.get(&help).is_some());
    assert_eq!(fs::read_to_string(&curated).unwrap(), CURATED);
    assert_eq!(fs::read_to_string(layout.ledger_path()).unwrap(), ledger_before);
}

#[test]
fn rm_temp_on_untracked_path_is_not_tracked() {
    let (_tmp, layout, mut ledger) = project();
    let err = tracker::rm_temp(&layout, &mut ledger, &layout.root().join("ghost.py"), false)
        .unwrap_err();
    assert!(matches!(err, SyncError::NotTracked { .. }));
}

#[test]
fn make_requires_confirmation_to_take_over_curated() {
    let (_tmp, layout, mut ledger) = project();
    let curated = layout.root().join("templates/blueprints.py");
    fs::create_dir_all(curated.parent().unwrap()).unwrap();
    fs::write(&curated, CURATED).unwrap();
    let help = curated_record(&layout, &mut ledger, "src/help.py", "help_cmd");

    let err = tracker::make(&layout, &mut ledger, &help, false, false).unwrap_err();
    assert!(matches!(err, SyncError::NotAuthorized { .. }));
    assert!(!layout.adhoc_container_for(&help).exists());

    let outcome = tracker::make(&layout, &mut ledger, &help, true, false).expect("confirmed make");
    assert!(outcome.took_over);
    assert!(outcome.container_created);
    assert_eq!(ledger.get(&help).unwrap().container_locator, ContainerLocator::AdHoc);
    assert_eq!(outcome.id.as_str(), "help_blueprint");
    // The curated definition stays where it was.
    assert_eq!(fs::read_to_string(&curated).unwrap(), CURATED);
}

#[test]
fn make_twice_reuses_the_id_and_refreshes_the_literal() {
    let (_tmp, layout, mut ledger) = project();
    let file = layout.root().join("notes.txt");
    fs::write(&file, "one\n").unwrap();
    let first = tracker::make(&layout, &mut ledger, &file, false, false).unwrap();
    fs::write(&file, "two\n").unwrap();
    let second = tracker::make(&layout, &mut ledger, &file, false, false).unwrap();

    assert_eq!(first.id, second.id);
    assert!(!second.container_created);
    let container = Container::load(&second.container).unwrap();
    assert_eq!(container.definitions().len(), 1);
    assert_eq!(container.literal(&second.id), Some("two\n"));
}

#[test]
fn make_missing_file_is_io_error() {
    let (_tmp, layout, mut ledger) = project();
    let err = tracker::make(&layout, &mut ledger, &layout.root().join("nope.py"), false, false)
        .unwrap_err();
    assert!(matches!(err, SyncError::Io { .. }));
    assert!(ledger.is_empty());
}

#[test]
fn same_stem_in_one_directory_gets_distinct_ids() {
    let (_tmp, layout, mut ledger) = project();
    let py = layout.root().join("setup.py");
    let cfg = layout.root().join("setup.cfg");
    fs::write(&py, "py\n").unwrap();
    fs::write(&cfg, "cfg\n").unwrap();
    let a = tracker::make(&layout, &mut ledger, &py, false, false).unwrap();
    let b = tracker::make(&layout, &mut ledger, &cfg, false, false).unwrap();

    assert_eq!(a.id.as_str(), "setup_blueprint");
    assert_eq!(b.id.as_str(), "setup_cfg_blueprint");
    assert_eq!(a.container, b.container);
}

#[test]
fn transfer_moves_definition_into_curated_container() {
    let (_tmp, layout, mut ledger) = project();
    let curated = layout.root().join("templates/blueprints.py");
    fs::create_dir_all(curated.parent().unwrap()).unwrap();
    fs::write(&curated, CURATED).unwrap();

    let tool = layout.root().join("tools/lint.cfg");
    fs::create_dir_all(tool.parent().unwrap()).unwrap();
    fs::write(&tool, "[lint]\n").unwrap();
    let made = tracker::make(&layout, &mut ledger, &tool, false, false).unwrap();
    assert_eq!(made.id.as_str(), "lint_blueprint");

    // Rename the id so it shares the `cfg` class with `setup_cfg`.
    let id = BlueprintId::from("lint_cfg");
    stencil_sync::container::delete_definition(&made.container, &made.id, None).unwrap();
    stencil_sync::container::write_definition(
        &made.container,
        &id,
        "[lint]\n",
        stencil_sync::Placement::Append,
        None,
    )
    .unwrap();
    ledger.get_mut(&tool).unwrap().blueprint_id = id.clone();

    let outcome = tracker::transfer(&layout, &mut ledger, &tool, &curated, false).expect("transfer");
    assert_eq!(outcome.into, curated);
    assert!(!made.container.exists());

    let target = Container::load(&curated).unwrap();
    let order: Vec<&str> = target.definitions().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(order, ["help_cmd", "setup_cfg", "lint_cfg"]);
    assert_eq!(
        ledger.get(&tool).unwrap().container_locator,
        ContainerLocator::Curated(PathBuf::from("templates/blueprints.py"))
    );
}

#[test]
fn transfer_refuses_curated_records() {
    let (_tmp, layout, mut ledger) = project();
    let help = curated_record(&layout, &mut ledger, "src/help.py", "help_cmd");
    let err = tracker::transfer(
        &layout,
        &mut ledger,
        &help,
        &layout.root().join("elsewhere.py"),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, SyncError::NotAuthorized { .. }));
    assert!(!layout.root().join("elsewhere.py").exists());
}

#[test]
fn transfer_refuses_target_holding_an_untracked_definition() {
    let (_tmp, layout, mut ledger) = project();
    let curated = layout.root().join("templates/blueprints.py");
    fs::create_dir_all(curated.parent().unwrap()).unwrap();
    let curated_text = "from textwrap import dedent\n\ncheck_blueprint = dedent(\"\"\"\\\nCURATED BODY\n\"\"\")\n";
    fs::write(&curated, curated_text).unwrap();

    let tool = layout.root().join("tools/check.x");
    fs::create_dir_all(tool.parent().unwrap()).unwrap();
    fs::write(&tool, "adhoc body\n").unwrap();
    let made = tracker::make(&layout, &mut ledger, &tool, false, false).unwrap();
    assert_eq!(made.id.as_str(), "check_blueprint");
    let adhoc_before = fs::read_to_string(&made.container).unwrap();

    let err = tracker::transfer(&layout, &mut ledger, &tool, &curated, false).unwrap_err();
    assert!(matches!(err, SyncError::NotAuthorized { .. }));
    assert_eq!(fs::read_to_string(&curated).unwrap(), curated_text);
    assert_eq!(fs::read_to_string(&made.container).unwrap(), adhoc_before);
    assert!(ledger.get(&tool).unwrap().container_locator.is_adhoc());
}

#[test]
fn make_does_not_claim_an_untracked_definition_in_its_container() {
    let (_tmp, layout, mut ledger) = project();
    let tool = layout.root().join("tools/check.x");
    fs::create_dir_all(tool.parent().unwrap()).unwrap();
    fs::write(&tool, "generated\n").unwrap();

    let container = layout.adhoc_container_for(&tool);
    fs::create_dir_all(container.parent().unwrap()).unwrap();
    fs::write(
        &container,
        "from textwrap import dedent\n\ncheck_blueprint = dedent(\"\"\"\\\nhand added\n\"\"\")\n",
    )
    .unwrap();

    let made = tracker::make(&layout, &mut ledger, &tool, false, false).unwrap();
    assert_eq!(made.id.as_str(), "check_x_blueprint");

    let loaded = Container::load(&container).unwrap();
    assert_eq!(loaded.literal(&BlueprintId::from("check_blueprint")), Some("hand added\n"));
    assert_eq!(loaded.literal(&made.id), Some("generated\n"));
}

#[test]
fn make_tracks_multi_byte_content() {
    let (_tmp, layout, mut ledger) = project();
    let tool = layout.root().join("tools/check.x");
    fs::create_dir_all(tool.parent().unwrap()).unwrap();
    fs::write(&tool, "# café for demo\nprint(\"✓ done — ok\")\n").unwrap();

    let made = tracker::make(&layout, &mut ledger, &tool, false, false).expect("make");
    let loaded = Container::load(&made.container).unwrap();
    assert!(loaded.corruption().is_none());
    assert_eq!(
        loaded.literal(&made.id),
        Some("# café for demo\nprint(\"✓ done — ok\")\n")
    );
}
