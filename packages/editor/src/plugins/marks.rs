//! Built-in mark capabilities

use std::collections::BTreeMap;

use folio_model::{AttrSpec, Attrs, DomAttrs, DomOutput, MarkSpec, ParseRule, Schema};
use serde_json::Value;

use crate::capability::{Capability, CapabilityKind, SchemaFragment};
use crate::commands::{inapplicable, toggle_mark, Command};

fn toggle(schema: &Schema, name: &str) -> Command {
    match schema.mark_type(name) {
        Some(mark_type) => toggle_mark(mark_type.clone(), None),
        None => inapplicable(),
    }
}

/// Hyperlink; typing at its end does not extend it
pub struct Link;

fn link_attrs(dom: &DomAttrs) -> Option<Attrs> {
    let href = dom.get("href")?;
    Some(Attrs::from([("href".to_string(), Value::from(href.as_str()))]))
}

impl Capability for Link {
    fn name(&self) -> &str {
        "link"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Mark
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Mark(MarkSpec {
            attrs: BTreeMap::from([("href".to_string(), AttrSpec::with_default(""))]),
            inclusive: false,
            parse_dom: vec![ParseRule::tag("a").with_get_attrs(link_attrs)],
            to_dom: Some(|attrs| {
                let href = attrs.get("href").and_then(Value::as_str).unwrap_or("");
                DomOutput::tag("a").with_attr("href", href)
            }),
        })
    }

    fn command(&self, schema: &Schema) -> Command {
        toggle(schema, self.name())
    }

    fn in_toolbar(&self) -> bool {
        true
    }
}

pub struct Bold;

impl Capability for Bold {
    fn name(&self) -> &str {
        "bold"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Mark
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Mark(MarkSpec {
            parse_dom: vec![ParseRule::tag("strong"), ParseRule::tag("b")],
            to_dom: Some(|_| DomOutput::tag("strong")),
            ..Default::default()
        })
    }

    fn keymaps(&self) -> &[&'static str] {
        &["Mod-b", "Mod-B"]
    }

    fn command(&self, schema: &Schema) -> Command {
        toggle(schema, self.name())
    }

    fn in_toolbar(&self) -> bool {
        true
    }
}

pub struct Italic;

impl Capability for Italic {
    fn name(&self) -> &str {
        "italic"
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Mark
    }

    fn schema_fragment(&self) -> SchemaFragment {
        SchemaFragment::Mark(MarkSpec {
            parse_dom: vec![ParseRule::tag("em"), ParseRule::tag("i")],
            to_dom: Some(|_| DomOutput::tag("em")),
            ..Default::default()
        })
    }

    fn keymaps(&self) -> &[&'static str] {
        &["Mod-i", "Mod-I"]
    }

    fn command(&self, schema: &Schema) -> Command {
        toggle(schema, self.name())
    }

    fn in_toolbar(&self) -> bool {
        true
    }
}
