use std::collections::BTreeMap;

use folio_html::{to_html, HtmlError, HtmlParser};
use folio_model::{
    AttrSpec, Attrs, DomAttrs, DomOutput, DomParser, MarkSpec, NodeSpec, ParseRule, Schema, SchemaSpec,
};
use serde_json::{json, Value};

fn heading_attrs(level: i64) -> Option<Attrs> {
    Some(Attrs::from([("level".to_string(), json!(level))]))
}

fn link_attrs(dom: &DomAttrs) -> Option<Attrs> {
    let href = dom.get("href")?;
    Some(Attrs::from([("href".to_string(), Value::from(href.as_str()))]))
}

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
                    parse_dom: vec![ParseRule::tag("p")],
                    to_dom: Some(|_| DomOutput::tag("p")),
                    ..Default::default()
                },
            ),
            (
                "blockquote".into(),
                NodeSpec {
                    content: Some("block+".into()),
                    group: Some("block".into()),
                    parse_dom: vec![ParseRule::tag("blockquote")],
                    to_dom: Some(|_| DomOutput::tag("blockquote")),
                    ..Default::default()
                },
            ),
            (
                "heading".into(),
                NodeSpec {
                    content: Some("inline*".into()),
                    group: Some("block".into()),
                    attrs: BTreeMap::from([("level".to_string(), AttrSpec::with_default(1))]),
                    parse_dom: vec![
                        ParseRule::tag("h1").with_get_attrs(|_| heading_attrs(1)),
                        ParseRule::tag("h2").with_get_attrs(|_| heading_attrs(2)),
                    ],
                    to_dom: Some(|attrs| {
                        let level = attrs.get("level").and_then(Value::as_i64).unwrap_or(1);
                        DomOutput::tag(format!("h{}", level))
                    }),
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
            (
                "hard_break".into(),
                NodeSpec {
                    group: Some("inline".into()),
                    inline: true,
                    parse_dom: vec![ParseRule::tag("br")],
                    to_dom: Some(|_| DomOutput::tag("br")),
                    ..Default::default()
                },
            ),
        ],
        marks: vec![
            (
                "link".into(),
                MarkSpec {
                    attrs: BTreeMap::from([("href".to_string(), AttrSpec::with_default(""))]),
                    inclusive: false,
                    parse_dom: vec![ParseRule::tag("a").with_get_attrs(link_attrs)],
                    to_dom: Some(|attrs| {
                        let href = attrs.get("href").and_then(Value::as_str).unwrap_or("");
                        DomOutput::tag("a").with_attr("href", href)
                    }),
                },
            ),
            (
                "bold".into(),
                MarkSpec {
                    parse_dom: vec![ParseRule::tag("strong"), ParseRule::tag("b")],
                    to_dom: Some(|_| DomOutput::tag("strong")),
                    ..Default::default()
                },
            ),
            (
                "italic".into(),
                MarkSpec {
                    parse_dom: vec![ParseRule::tag("em"), ParseRule::tag("i")],
                    to_dom: Some(|_| DomOutput::tag("em")),
                    ..Default::default()
                },
            ),
        ],
        top_node: None,
    })
    .unwrap()
}

fn parse(markup: &str) -> Value {
    let doc = HtmlParser::new().parse(markup, &schema()).unwrap();
    doc.check().unwrap();
    doc.to_json()
}

#[test]
fn test_paragraph_with_bold_run() {
    assert_eq!(
        parse("<p>a <strong>b</strong></p>"),
        json!({"type": "doc", "content": [{"type": "paragraph", "content": [
            {"type": "text", "text": "a "},
            {"type": "text", "text": "b", "marks": [{"type": "bold"}]}
        ]}]})
    );
}

#[test]
fn test_bare_text_is_wrapped_in_paragraph() {
    assert_eq!(
        parse("hello <em>world</em>"),
        json!({"type": "doc", "content": [{"type": "paragraph", "content": [
            {"type": "text", "text": "hello "},
            {"type": "text", "text": "world", "marks": [{"type": "italic"}]}
        ]}]})
    );
}

#[test]
fn test_whitespace_between_blocks_is_ignored() {
    assert_eq!(
        parse("<h2>Title</h2>\n   <p>  body\n text  </p>\n"),
        json!({"type": "doc", "content": [
            {"type": "heading", "attrs": {"level": 2}, "content": [{"type": "text", "text": "Title"}]},
            {"type": "paragraph", "content": [{"type": "text", "text": "body text"}]}
        ]})
    );
}

#[test]
fn test_link_and_hard_break() {
    assert_eq!(
        parse("<p><a href=\"https://example.com\">go</a><br>next</p>"),
        json!({"type": "doc", "content": [{"type": "paragraph", "content": [
            {"type": "text", "text": "go", "marks": [{"type": "link", "attrs": {"href": "https://example.com"}}]},
            {"type": "hard_break"},
            {"type": "text", "text": "next"}
        ]}]})
    );
}

#[test]
fn test_div_splits_paragraphs_and_script_is_dropped() {
    assert_eq!(
        parse("one<div>two</div><script>alert(1)</script>"),
        json!({"type": "doc", "content": [
            {"type": "paragraph", "content": [{"type": "text", "text": "one"}]},
            {"type": "paragraph", "content": [{"type": "text", "text": "two"}]}
        ]})
    );
}

#[test]
fn test_empty_input_yields_empty_paragraph() {
    assert_eq!(
        parse(""),
        json!({"type": "doc", "content": [{"type": "paragraph"}]})
    );
}

#[test]
fn test_blockquote_nesting() {
    assert_eq!(
        parse("<blockquote>quoted</blockquote>"),
        json!({"type": "doc", "content": [{"type": "blockquote", "content": [
            {"type": "paragraph", "content": [{"type": "text", "text": "quoted"}]}
        ]}]})
    );
}

#[test]
fn test_serialize_round_trip() {
    let s = schema();
    let markup = "<h1>T</h1><p>a <strong>b<em>c</em></strong> &amp; <a href=\"u\">l</a><br>x</p>";
    let doc = HtmlParser::new().parse(markup, &s).unwrap();
    assert_eq!(to_html(&doc).unwrap(), markup);
}

#[test]
fn test_missing_serializer_reported() {
    let s = Schema::new(SchemaSpec {
        nodes: vec![
            (
                "doc".into(),
                NodeSpec {
                    content: Some("para+".into()),
                    ..Default::default()
                },
            ),
            (
                "para".into(),
                NodeSpec {
                    content: Some("text*".into()),
                    ..Default::default()
                },
            ),
            ("text".into(), NodeSpec::default()),
        ],
        marks: vec![],
        top_node: None,
    })
    .unwrap();
    let doc = s
        .node_from_json(&json!({"type": "doc", "content": [{"type": "para"}]}))
        .unwrap();
    assert_eq!(to_html(&doc), Err(HtmlError::NoSerializer("para".into())));
}
