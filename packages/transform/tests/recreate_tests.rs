//! The derived transform must always reproduce the target document

use folio_model::{MarkSpec, Node, NodeSpec, Schema, SchemaSpec};
use folio_transform::{recreate_transform, DiffOp, DocumentDiff, RecreateOptions};
use serde_json::{json, Value};

fn schema() -> Schema {
    let node = |content: Option<&str>, group: Option<&str>, inline: bool| NodeSpec {
        content: content.map(str::to_string),
        group: group.map(str::to_string),
        inline,
        ..Default::default()
    };
    Schema::new(SchemaSpec {
        nodes: vec![
            ("doc".into(), node(Some("block+"), None, false)),
            ("paragraph".into(), node(Some("inline*"), Some("block"), false)),
            ("blockquote".into(), node(Some("block+"), Some("block"), false)),
            ("text".into(), node(None, Some("inline"), true)),
            ("hard_break".into(), node(None, Some("inline"), true)),
        ],
        marks: vec![
            ("bold".into(), MarkSpec::default()),
            ("italic".into(), MarkSpec::default()),
        ],
        top_node: None,
    })
    .unwrap()
}

fn parse(schema: &Schema, value: Value) -> Node {
    let node = schema.node_from_json(&value).unwrap();
    node.check().unwrap();
    node
}

fn para(text: &str) -> Value {
    json!({"type": "paragraph", "content": [{"type": "text", "text": text}]})
}

fn assert_reproduces(before: Value, after: Value) {
    let s = schema();
    let a = parse(&s, before);
    let b = parse(&s, after);

    for options in [
        RecreateOptions::default(),
        RecreateOptions {
            allow_non_replace_steps: false,
            word_granularity: false,
        },
        RecreateOptions {
            allow_non_replace_steps: true,
            word_granularity: true,
        },
    ] {
        let tr = recreate_transform(&a, &b, options).unwrap();
        let mut doc = a.clone();
        for step in tr.steps() {
            doc = step.apply(&doc).unwrap();
        }
        assert_eq!(doc, b, "options {:?}", options);
    }
}

#[test]
fn test_paragraph_added_at_end() {
    assert_reproduces(
        json!({"type": "doc", "content": [para("one")]}),
        json!({"type": "doc", "content": [para("one"), para("two")]}),
    );
}

#[test]
fn test_paragraph_removed_from_middle() {
    assert_reproduces(
        json!({"type": "doc", "content": [para("one"), para("two"), para("three")]}),
        json!({"type": "doc", "content": [para("one"), para("three")]}),
    );
}

#[test]
fn test_blocks_wrapped_in_quote() {
    assert_reproduces(
        json!({"type": "doc", "content": [para("one"), para("two")]}),
        json!({"type": "doc", "content": [
            {"type": "blockquote", "content": [para("one")]},
            para("two")
        ]}),
    );
}

#[test]
fn test_paragraphs_joined() {
    assert_reproduces(
        json!({"type": "doc", "content": [para("ab"), para("cd")]}),
        json!({"type": "doc", "content": [para("abcd")]}),
    );
}

#[test]
fn test_mixed_text_and_mark_change() {
    assert_reproduces(
        json!({"type": "doc", "content": [para("hello world")]}),
        json!({"type": "doc", "content": [{"type": "paragraph", "content": [
            {"type": "text", "text": "hello "},
            {"type": "text", "text": "there", "marks": [{"type": "italic"}]}
        ]}]}),
    );
}

#[test]
fn test_hard_break_inserted() {
    assert_reproduces(
        json!({"type": "doc", "content": [para("ab")]}),
        json!({"type": "doc", "content": [{"type": "paragraph", "content": [
            {"type": "text", "text": "a"},
            {"type": "hard_break"},
            {"type": "text", "text": "b"}
        ]}]}),
    );
}

#[test]
fn test_emptied_document() {
    assert_reproduces(
        json!({"type": "doc", "content": [para("text"), para("more")]}),
        json!({"type": "doc", "content": [{"type": "paragraph"}]}),
    );
}

#[test]
fn test_diff_ops_for_formatting_change() {
    let s = schema();
    let a = parse(&s, json!({"type": "doc", "content": [para("abc")]}));
    let b = parse(
        &s,
        json!({"type": "doc", "content": [{"type": "paragraph", "content": [
            {"type": "text", "text": "abc", "marks": [{"type": "bold"}]}
        ]}]}),
    );

    let tr = recreate_transform(&a, &b, RecreateOptions::default()).unwrap();
    let diff = DocumentDiff::from_transform(&tr);
    assert_eq!(
        diff.ops,
        vec![DiffOp::AddMark {
            from: 1,
            to: 4,
            mark: json!({"type": "bold"})
        }]
    );
    assert_eq!(diff.changes.len(), 1);
}
