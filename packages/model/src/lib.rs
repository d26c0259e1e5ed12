//! # Folio Model
//!
//! Persistent document model for the Folio rich-text editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: NodeSpec/MarkSpec → Schema          │
//! │  - content expressions, mark sets, attrs    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ model: immutable Node / Fragment trees      │
//! │  - JSON codec, positions, slices, replace   │
//! │  - structural diff (find_diff_start/end)    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Documents are values. Every edit produces a new [`Node`] that shares all
//! untouched subtrees with the previous one, so snapshots cost nothing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_model::Schema;
//!
//! let doc = schema.node_from_json(&json)?;
//! doc.check()?;
//!
//! let changed = before.content().find_diff_start(after.content(), 0).is_some();
//! ```

mod content;
mod dom;
mod error;
mod fragment;
mod json;
mod mark;
mod node;
mod resolved_pos;
mod schema;
mod slice;

pub use dom::{DomAttrs, DomOutput, DomParser, GetAttrs, ParseRule, ToDom};
pub use error::{ModelError, ModelResult};
pub use fragment::Fragment;
pub use mark::Mark;
pub use node::Node;
pub use resolved_pos::ResolvedPos;
pub use schema::{AttrSpec, Attrs, MarkSpec, MarkType, NodeSpec, NodeType, Schema, SchemaSpec};
pub use slice::Slice;

#[cfg(test)]
pub(crate) mod test_schema {
    use std::collections::BTreeMap;

    use crate::*;

    pub fn schema() -> Schema {
        let node = |content: Option<&str>, group: Option<&str>| NodeSpec {
            content: content.map(str::to_string),
            group: group.map(str::to_string),
            ..Default::default()
        };

        Schema::new(SchemaSpec {
            nodes: vec![
                ("doc".into(), node(Some("block+"), None)),
                ("paragraph".into(), node(Some("inline*"), Some("block"))),
                ("blockquote".into(), node(Some("block+"), Some("block"))),
                (
                    "heading".into(),
                    NodeSpec {
                        attrs: BTreeMap::from([("level".to_string(), AttrSpec::with_default(1))]),
                        ..node(Some("inline*"), Some("block"))
                    },
                ),
                ("text".into(), node(None, Some("inline"))),
                (
                    "hard_break".into(),
                    NodeSpec {
                        inline: true,
                        leaf_text: Some("\n".into()),
                        ..node(None, Some("inline"))
                    },
                ),
            ],
            marks: vec![
                (
                    "link".into(),
                    MarkSpec {
                        attrs: BTreeMap::from([("href".to_string(), AttrSpec::required())]),
                        inclusive: false,
                        ..Default::default()
                    },
                ),
                ("bold".into(), MarkSpec::default()),
                ("italic".into(), MarkSpec::default()),
            ],
            top_node: None,
        })
        .expect("test schema is valid")
    }

    pub fn doc(schema: &Schema, content: Vec<Node>) -> Node {
        schema.node("doc", None, content, vec![]).expect("valid doc")
    }

    pub fn p(schema: &Schema, content: Vec<Node>) -> Node {
        schema.node("paragraph", None, content, vec![]).expect("valid paragraph")
    }

    pub fn text(schema: &Schema, text: &str) -> Node {
        schema.text(text, vec![]).expect("non-empty text")
    }
}
