//! Instantiate-then-literalize round trips against curated container text.
//!
//! Each `#[case]` is a blueprint body as it appears in a container; the
//! artifact is produced by expanding it, and literalizing that artifact must
//! give the body back byte for byte.

use rstest::rstest;

use stencil_blueprint::{expand, extract, literalize, scan, BodyStyle};
use stencil_core::ParameterSet;

fn params() -> ParameterSet {
    [
        ("packName", "acme"),
        ("packDescription", "Acme command line tools"),
        ("version", "1.2.0"),
        ("author", "Jo Doe"),
    ]
    .into_iter()
    .collect()
}

#[rstest]
#[case::module("import {packName}\n\n__version__ = \"{version}\"\n")]
#[case::braces("def cfg():\n    return {{\"name\": \"{packName}\"}}\n")]
#[case::docstring("def run():\n    \\\"\\\"\\\"{packDescription}.\\\"\\\"\\\"\n    pass\n")]
#[case::backslashes("PATTERN = r\"\\\\d+\"  # by {author}\n")]
#[case::trailing_quote("print(\"{packName}\\\"")]
#[case::unicode("# café — {packName} ✓\nprint(\"naïve 日本\")\n")]
fn expand_then_literalize_is_identity(#[case] body: &str) {
    let container = BodyStyle::BLUEPRINT.render("main_blueprint", body);
    let span = extract(&container, "main_blueprint").expect("extract");
    let literal = span.body_text(&container);
    assert_eq!(literal, body);

    let artifact = expand(literal, &params()).expect("expand");
    assert_eq!(literalize(&artifact, &params()), body);
}

#[test]
fn sibling_definitions_survive_scanning_a_rendered_container() {
    let mut container = String::from("from textwrap import dedent\n\n");
    for id in ["help_cmd", "sync_cmd", "check_blueprint"] {
        let raw = format!("# {id} for acme\nprint(\"{{}}\")\n");
        let body = literalize(&raw, &params());
        container.push_str(&BodyStyle::BLUEPRINT.render(id, &body));
        container.push('\n');
    }

    let spans = scan(&container).expect("scan");
    assert_eq!(spans.len(), 3);
    for span in &spans {
        let raw = expand(span.body_text(&container), &params()).expect("expand");
        assert_eq!(raw, format!("# {} for acme\nprint(\"{{}}\")\n", span.id));
    }
}
