//! Integration tests for failure reporting
//!
//! These tests cover furthest-progress selection, report rendering, node
//! splicing and the structured report surface.

use retrace::engine::attempt_tree::AttemptTree;
use retrace::prelude::*;

fn labels_under(tree: &AttemptTree, node: retrace::engine::NodeId) -> Vec<String> {
    tree[node]
        .children()
        .iter()
        .map(|&c| tree[c].label.to_string())
        .collect()
}

fn failure_of<T: std::fmt::Debug>(result: Result<T, ParseError>) -> ParseFailure {
    match result {
        Err(ParseError::Failed(failure)) => *failure,
        other => panic!("expected a parse failure, got {:?}", other),
    }
}

// ============================================================================
// Furthest progress
// ============================================================================

#[test]
fn test_report_points_at_deepest_failure() {
    let p = string("foo")
        .then(repeat(spaced(string("bar")), 3))
        .before(eof());
    let failure = failure_of(p.parse("foo\nbar bar box"));

    assert_eq!(failure.line_number(), 2);
    assert_eq!(failure.column(), 9);
    assert_eq!(failure.line_text(), "bar bar box");
    assert_eq!(failure.furthest(), 12);
    assert_ne!(failure.expected(), "eof");

    let expected = "\
expected spaced \"bar\" at line 2, column 9
line 2:
  bar bar box
          V success: whitespace
          \\-/ failure: \"bar\"
          \\-/ failure: spaced \"bar\"
  ----------/ failure: repeat 3 spaced \"bar\"";
    assert_eq!(failure.render(), expected);
}

#[test]
fn test_report_entries_innermost_first() {
    let p = string("foo")
        .then(repeat(spaced(string("bar")), 3))
        .before(eof());
    let failure = failure_of(p.parse("foo\nbar bar box"));

    let entries: Vec<(&str, Outcome)> = failure
        .entries()
        .iter()
        .map(|e| (e.label.as_str(), e.outcome))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("whitespace", Outcome::Success),
            ("\"bar\"", Outcome::Failure),
            ("spaced \"bar\"", Outcome::Failure),
            ("repeat 3 spaced \"bar\"", Outcome::Failure),
        ]
    );
    assert_eq!(failure.entries()[1].range, PosRange::new(12, 15));
    assert_eq!(failure.entries()[3].range, PosRange::new(3, 15));
}

#[test]
fn test_trailing_input_reports_eof() {
    let p = string("ab").before(eof());
    let failure = failure_of(p.parse("abc"));
    assert_eq!(failure.expected(), "eof");
    assert_eq!(failure.column(), 3);
}

#[test]
fn test_competing_alternatives_are_reported() {
    let p = string("let").or(string("loop")).or(string("log"));
    let failure = failure_of(p.parse("lamp"));

    assert_eq!(failure.expected(), "one of \"let\", \"loop\", \"log\"");
    let labels: Vec<&str> = failure.entries().iter().map(|e| e.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "\"let\"",
            "\"loop\"",
            "\"log\"",
            "one of \"let\", \"loop\", \"log\""
        ]
    );
}

#[test]
fn test_many_attempt_shown_next_to_failure() {
    let p = many(string("a")).then(string("b"));
    let failure = failure_of(p.parse("aac"));

    assert_eq!(failure.expected(), "\"b\"");
    let labels: Vec<(&str, Outcome)> = failure
        .entries()
        .iter()
        .map(|e| (e.label.as_str(), e.outcome))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("\"a\"", Outcome::Failure),
            ("many \"a\"", Outcome::Success),
            ("\"b\"", Outcome::Failure),
        ]
    );
}

// ============================================================================
// Labels
// ============================================================================

#[test]
fn test_label_replaces_structure_as_alternative() {
    let p = string("a").label("X").or(string("b").label("Y"));
    let failure = failure_of(p.parse("c"));

    assert_eq!(failure.expected(), "one of X, Y");
    let labels: Vec<&str> = failure.entries().iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["X", "Y", "one of X, Y"]);
}

#[test]
fn test_labelled_sequence_keeps_its_node() {
    let p = string("a").then(string("b")).label("X");
    let failure = failure_of(p.parse("ac"));

    assert_eq!(failure.expected(), "\"b\"");
    let last = failure.entries().last().unwrap();
    assert_eq!(last.label, "X");
    assert_eq!(last.outcome, Outcome::Failure);
    assert!(failure.render().contains("failure: X"));
}

#[test]
fn test_labelled_sequence_as_alternative() {
    let p = string("a")
        .then(string("b"))
        .label("X")
        .or(string("c").label("Y"));
    let failure = failure_of(p.parse("ax"));

    assert_eq!(failure.expected(), "\"b\"");
    assert_eq!(failure.furthest(), 1);
    let entries: Vec<(&str, Outcome, PosRange)> = failure
        .entries()
        .iter()
        .map(|e| (e.label.as_str(), e.outcome, e.range))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("\"b\"", Outcome::Failure, PosRange::new(1, 2)),
            ("X", Outcome::Failure, PosRange::new(0, 2)),
            ("one of X, Y", Outcome::Failure, PosRange::new(0, 2)),
        ]
    );
    assert!(failure.entries().iter().all(|e| !e.label.contains("then")));
}

#[test]
fn test_try_map_rejection_is_reported() {
    let byte = decimal().try_map(|n| u8::try_from(n).map_err(|_| "byte value"));
    let failure = failure_of(byte.parse("300"));
    assert_eq!(failure.expected(), "byte value");
    assert_eq!(failure.column(), 1);
}

// ============================================================================
// Tree shape
// ============================================================================

#[test]
fn test_structural_combinators_splice() {
    let p = string("a").then(string("b")).then(string("c"));
    let failure = failure_of(p.parse("abx"));
    let tree = failure.tree();
    assert_eq!(
        labels_under(tree, tree.root()),
        vec!["\"a\"", "\"b\"", "\"c\""]
    );
}

#[test]
fn test_primitive_hides_children() {
    let p = whitespace().then(string("x"));
    let failure = failure_of(p.parse("  y"));
    let tree = failure.tree();
    let root_children = tree[tree.root()].children();
    assert_eq!(tree[root_children[0]].label.as_ref(), "whitespace");
    assert!(tree[root_children[0]].children().is_empty());
    assert_eq!(tree[root_children[0]].range, PosRange::new(0, 2));
}

#[test]
fn test_splice_end_dissolves_up_to_anchor() {
    let pair = string("x").then(string("y").splice_end()).label("xy");
    let group = between(string("["), string("]"), many(pair)).splice_start();
    let p = group.before(eof());
    let failure = failure_of(p.parse("[xyxy]z"));
    let tree = failure.tree();

    let top = tree[tree.root()].children()[0];
    assert!(tree[top].is_anchor());
    assert_eq!(
        labels_under(tree, top),
        vec!["\"[\"", "\"x\"", "\"y\"", "\"x\"", "\"y\"", "xy", "\"]\""]
    );
}

#[test]
fn test_explicit_splice() {
    let inner = between(string("<"), string(">"), decimal()).splice();
    let failure = failure_of(inner.parse("<1]"));
    let tree = failure.tree();
    assert_eq!(
        labels_under(tree, tree.root()),
        vec!["\"<\"", "number", "\">\""]
    );
}

#[test]
fn test_ascii_tree_dump() {
    let failure = failure_of(string("a").or(string("b")).parse("c"));
    let dump = failure.tree().ascii_tree();
    assert!(dump.contains("one of \"a\", \"b\" 0..1 failure"));
    assert!(dump.contains("\"a\" 0..1 failure"));
}

// ============================================================================
// Report surface
// ============================================================================

#[test]
fn test_report_is_deterministic() {
    let p = sep_by1(decimal(), string(",")).before(eof());
    let a = failure_of(p.parse("1,2,x")).render();
    let b = failure_of(p.parse("1,2,x")).render();
    assert_eq!(a, b);
}

#[test]
fn test_report_json() {
    let p = string("foo").before(eof());
    let failure = failure_of(p.parse("foo!"));
    let json: serde_json::Value = serde_json::from_str(&failure.to_json().unwrap()).unwrap();

    assert_eq!(json["expected"], "eof");
    assert_eq!(json["line"]["number"], 1);
    assert_eq!(json["line"]["text"], "foo!");
    assert_eq!(json["column"], 4);
    assert_eq!(json["entries"][0]["label"], "eof");
    assert_eq!(json["entries"][0]["outcome"], "failure");
}

#[test]
fn test_parse_error_display_matches_render() {
    let err = string("x").parse("y").unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(err.to_string(), failure.render());
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_multiline_source_line_selection() {
    let line = string("ok").before(string("\n"));
    let p = many(line).before(eof());
    let failure = failure_of(p.parse("ok\nok\nko\n"));
    assert_eq!(failure.line_number(), 3);
    assert_eq!(failure.column(), 1);
    assert_eq!(failure.line_text(), "ko");
}

#[test]
fn test_crlf_line_text() {
    let p = string("a\r\n").then(string("b"));
    let failure = failure_of(p.parse("a\r\nc\r\n"));
    assert_eq!(failure.line_number(), 2);
    assert_eq!(failure.line_text(), "c");
}
