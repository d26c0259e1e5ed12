//! Built-in node capabilities

use std::collections::BTreeMap;

use folio_model::{AttrSpec, Attrs, DomOutput, NodeSpec, ParseRule, Schema};
use serde_json::{json, Value};

use crate::capability::{Capability, CapabilityKind, SchemaFragment};
use crate::commands::{inapplicable, insert_node, set_block_type, toggle_block_type, wrap_in, Command};
use crate::input_rules::{blockquote_match, heading_match, InputRule, RuleAction};

pub struct Text;

impl Capability for Text {
    fn name(&self) -> &str {
        "text"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Node
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Node(NodeSpec {
            group: Some("inline".into()),
            ..Default::default()
        })
    }

    fn command(&self, _schema: &Schema) -> Command {
        inapplicable()
    }
}

pub struct Doc;

impl Capability for Doc {
    fn name(&self) -> &str {
        "doc"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Node
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Node(NodeSpec {
            content: Some("block+".into()),
            ..Default::default()
        })
    }

    fn command(&self, _schema: &Schema) -> Command {
        inapplicable()
    }
}

pub struct HardBreak;

impl Capability for HardBreak {
    fn name(&self) -> &str {
        "hard_break"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Node
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Node(NodeSpec {
            inline: true,
            group: Some("inline".into()),
            leaf_text: Some("\n".into()),
            parse_dom: vec![ParseRule::tag("br")],
            to_dom: Some(|_| DomOutput::tag("br")),
            ..Default::default()
        })
    }

    fn keymaps(&self) -> &[&'static str] {
        &["Mod-Enter", "Shift-Enter"]
    }

    fn command(&self, schema: &Schema) -> Command {
        match schema.node_type(self.name()) {
            Some(ty) => insert_node(ty.clone()),
            None => inapplicable(),
        }
    }
}

pub struct Paragraph;

impl Capability for Paragraph {
    fn name(&self) -> &str {
        "paragraph"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Node
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Node(NodeSpec {
            content: Some("inline*".into()),
            group: Some("block".into()),
            parse_dom: vec![ParseRule::tag("p")],
            to_dom: Some(|_| DomOutput::tag("p")),
            ..Default::default()
        })
    }

    fn keymaps(&self) -> &[&'static str] {
        &["Shift-Ctrl-0"]
    }

    fn command(&self, schema: &Schema) -> Command {
        match schema.node_type(self.name()) {
            Some(ty) => set_block_type(ty.clone(), None),
            None => inapplicable(),
        }
    }

    fn in_toolbar(&self) -> bool {
        true
    }
}

pub struct Blockquote;

impl Capability for Blockquote {
    fn name(&self) -> &str {
        "blockquote"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Node
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Node(NodeSpec {
            content: Some("block+".into()),
            group: Some("block".into()),
            defining: true,
            parse_dom: vec![ParseRule::tag("blockquote")],
            to_dom: Some(|_| DomOutput::tag("blockquote")),
            ..Default::default()
        })
    }

    fn keymaps(&self) -> &[&'static str] {
        &["Ctrl->"]
    }

    fn command(&self, schema: &Schema) -> Command {
        match schema.node_type(self.name()) {
            Some(ty) => wrap_in(ty.clone(), None),
            None => inapplicable(),
        }
    }

    fn in_toolbar(&self) -> bool {
        true
    }

    fn input_rules(&self, schema: &Schema) -> Vec<InputRule> {
        schema
            .node_type(self.name())
            .map(|ty| InputRule::new("blockquote", blockquote_match, RuleAction::Wrap(ty.clone())))
            .into_iter()
            .collect()
    }
}

pub struct Heading;

fn heading_attrs(level: u8) -> Attrs {
    Attrs::from([("level".to_string(), json!(level))])
}

impl Capability for Heading {
    fn name(&self) -> &str {
        "heading"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Node
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Node(NodeSpec {
            content: Some("inline*".into()),
            group: Some("block".into()),
            defining: true,
            attrs: BTreeMap::from([("level".to_string(), AttrSpec::with_default(1))]),
            parse_dom: (1..=6)
                .map(|level| ParseRule::tag(format!("h{}", level)).with_attr("level", json!(level)))
                .collect(),
            to_dom: Some(|attrs| {
                let level = attrs.get("level").and_then(Value::as_u64).unwrap_or(1);
                DomOutput::tag(format!("h{}", level))
            }),
            ..Default::default()
        })
    }

    fn keymaps(&self) -> &[&'static str] {
        &["Shift-Ctrl-1"]
    }

    fn command(&self, schema: &Schema) -> Command {
        match (schema.node_type(self.name()), schema.default_textblock_type()) {
            (Some(ty), Some(fallback)) => {
                toggle_block_type(ty.clone(), Some(heading_attrs(1)), fallback.clone())
            }
            _ => inapplicable(),
        }
    }

    fn in_toolbar(&self) -> bool {
        true
    }

    fn input_rules(&self, schema: &Schema) -> Vec<InputRule> {
        schema
            .node_type(self.name())
            .map(|ty| InputRule::new("heading", heading_match, RuleAction::SetBlockType(ty.clone())))
            .into_iter()
            .collect()
    }
}
