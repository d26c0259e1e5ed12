//! # Folio Transform
//!
//! Steps, transforms and diff derivation on top of `folio-model`.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Step: Replace | AddMark | RemoveMark          │
//! │  - apply / invert / get_map                   │
//! └───────────────────────────────────────────────┘
//!                       ↓
//! ┌───────────────────────────────────────────────┐
//! │ Transform: step accumulator + builder methods │
//! └───────────────────────────────────────────────┘
//!                       ↓
//! ┌───────────────────────────────────────────────┐
//! │ recreate_transform(before, after) → steps     │
//! │ DocumentDiff: ops + change spans              │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_transform::{recreate_transform, DocumentDiff, RecreateOptions};
//!
//! let tr = recreate_transform(&before, &after, RecreateOptions::default())?;
//! let diff = DocumentDiff::from_transform(&tr);
//! ```

mod changes;
mod error;
mod map;
mod recreate;
mod step;
mod transform;

pub use changes::{Change, DiffOp, DocumentDiff};
pub use error::{StepError, StepResult};
pub use map::{Assoc, MapRange, Mapping, StepMap};
pub use recreate::{recreate_transform, RecreateOptions};
pub use step::Step;
pub use transform::Transform;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use folio_model::{AttrSpec, MarkSpec, Node, NodeSpec, Schema, SchemaSpec};

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
