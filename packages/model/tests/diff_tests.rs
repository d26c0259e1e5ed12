//! Structural diff tests for find_diff_start / find_diff_end

use folio_model::{MarkSpec, NodeSpec, Schema, SchemaSpec};
use serde_json::json;

fn schema() -> Schema {
    Schema::new(SchemaSpec {
        nodes: vec![
            (
                "doc".into(),
                NodeSpec {
                    content: Some("block+".into()),
                    ..Default::default()
                },
            ),
            (
                "paragraph".into(),
                NodeSpec {
                    content: Some("inline*".into()),
                    group: Some("block".into()),
                    ..Default::default()
                },
            ),
            (
                "text".into(),
                NodeSpec {
                    group: Some("inline".into()),
                    ..Default::default()
                },
            ),
        ],
        marks: vec![("bold".into(), MarkSpec::default())],
        top_node: None,
    })
    .unwrap()
}

fn paragraphs(texts: &[&str]) -> serde_json::Value {
    json!({
        "type": "doc",
        "content": texts.iter().map(|t| if t.is_empty() {
            json!({"type": "paragraph"})
        } else {
            json!({"type": "paragraph", "content": [{"type": "text", "text": t}]})
        }).collect::<Vec<_>>()
    })
}

#[test]
fn test_identical_documents_have_no_diff() {
    let s = schema();
    let a = s.node_from_json(&paragraphs(&["hello", "world"])).unwrap();
    let b = s.node_from_json(&paragraphs(&["hello", "world"])).unwrap();

    assert_eq!(a.content().find_diff_start(b.content(), 0), None);
    assert_eq!(a.content().find_diff_end(b.content(), a.content().size(), b.content().size()), None);
}

#[test]
fn test_appended_character() {
    let s = schema();
    let a = s.node_from_json(&paragraphs(&["hi"])).unwrap();
    let b = s.node_from_json(&paragraphs(&["hi!"])).unwrap();

    assert_eq!(a.content().find_diff_start(b.content(), 0), Some(3));
    assert_eq!(
        a.content().find_diff_end(b.content(), a.content().size(), b.content().size()),
        Some((3, 4))
    );
}

#[test]
fn test_changed_second_block() {
    let s = schema();
    let a = s.node_from_json(&paragraphs(&["one", "two"])).unwrap();
    let b = s.node_from_json(&paragraphs(&["one", "too"])).unwrap();

    // "one" occupies 0..5, the second paragraph opens at 5, "t" is at 6
    assert_eq!(a.content().find_diff_start(b.content(), 0), Some(7));
    assert_eq!(
        a.content().find_diff_end(b.content(), a.content().size(), b.content().size()),
        Some((8, 8))
    );
}

#[test]
fn test_added_block() {
    let s = schema();
    let a = s.node_from_json(&paragraphs(&["one"])).unwrap();
    let b = s.node_from_json(&paragraphs(&["one", ""])).unwrap();

    assert_eq!(a.content().find_diff_start(b.content(), 0), Some(5));
}

#[test]
fn test_mark_change_is_a_difference() {
    let s = schema();
    let a = s.node_from_json(&paragraphs(&["bold"])).unwrap();
    let b = s
        .node_from_json(&json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "bold", "marks": [{"type": "bold"}]}
            ]}]
        }))
        .unwrap();

    assert_eq!(a.content().find_diff_start(b.content(), 0), Some(1));
}

#[test]
fn test_range_has_mark_any_overlap() {
    let s = schema();
    let doc = s
        .node_from_json(&json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "ab"},
                {"type": "text", "text": "cd", "marks": [{"type": "bold"}]}
            ]}]
        }))
        .unwrap();
    let bold = s.mark_type("bold").unwrap();

    assert!(!doc.range_has_mark(1, 3, bold));
    assert!(doc.range_has_mark(2, 4, bold));
    assert!(doc.range_has_mark(1, 5, bold));
    assert!(!doc.range_has_mark(3, 3, bold));
}
