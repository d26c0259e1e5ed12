//! # Schema assembly
//!
//! The [`Registry`] owns the registered capabilities and the schema built
//! from their fragments. It is assembled once per editor and never changes.

use std::collections::HashSet;

use folio_model::{ModelError, Schema, SchemaSpec};
use tracing::debug;

use crate::capability::{Capability, CapabilityKind, SchemaFragment};
use crate::document::DocumentBuilder;
use crate::errors::{EditorError, EditorResult};
use crate::input_rules::InputRule;
use crate::plugins::default_capabilities;

pub struct Registry {
    capabilities: Vec<Box<dyn Capability>>,
    schema: Schema,
    builder: DocumentBuilder,
}

impl Registry {
    /// Assemble the schema. Fails when two capabilities share a name or a
    /// fragment is not a valid schema definition.
    pub fn new(capabilities: Vec<Box<dyn Capability>>) -> EditorResult<Self> {
        let mut seen = HashSet::new();
        let mut spec = SchemaSpec::default();

        for capability in &capabilities {
            let name = capability.name().to_string();
            if !seen.insert(name.clone()) {
                return Err(EditorError::SchemaConflict { name });
            }

            let fragment = capability.schema_fragment();
            if fragment.kind() != capability.kind() {
                return Err(EditorError::InvalidSchemaFragment {
                    name,
                    message: format!("fragment kind {:?} does not match the capability", fragment.kind()),
                });
            }
            match fragment {
                SchemaFragment::Mark(mark) => spec.marks.push((name, mark)),
                SchemaFragment::Node(node) => spec.nodes.push((name, node)),
            }
        }

        let schema = Schema::new(spec).map_err(|err| match err {
            ModelError::InvalidSchema { name, message } => EditorError::InvalidSchemaFragment { name, message },
            other => EditorError::Model(other),
        })?;
        let builder = DocumentBuilder::new(schema.clone())?;

        let registry = Self {
            capabilities,
            schema,
            builder,
        };
        for capability in registry.iter() {
            registry.check_known(capability)?;
        }

        debug!(
            marks = registry.marks().count(),
            nodes = registry.nodes().count(),
            "schema assembled"
        );
        Ok(registry)
    }

    /// Registry with the built-in capabilities
    pub fn with_defaults() -> EditorResult<Self> {
        Self::new(default_capabilities())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn builder(&self) -> &DocumentBuilder {
        &self.builder
    }

    /// Mark capabilities in registration order
    pub fn marks(&self) -> impl Iterator<Item = &dyn Capability> {
        self.of_kind(CapabilityKind::Mark)
    }

    /// Node capabilities in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &dyn Capability> {
        self.of_kind(CapabilityKind::Node)
    }

    /// Marks first, then nodes
    pub fn iter(&self) -> impl Iterator<Item = &dyn Capability> {
        self.marks().chain(self.nodes())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Capability> {
        self.iter().find(|capability| capability.name() == name)
    }

    /// Input rules of all capabilities, in registration order
    pub fn input_rules(&self) -> Vec<InputRule> {
        self.iter()
            .flat_map(|capability| capability.input_rules(&self.schema))
            .collect()
    }

    /// Fails when `capability` has no type in the schema
    pub fn check_known(&self, capability: &dyn Capability) -> EditorResult<()> {
        let known = match capability.kind() {
            CapabilityKind::Mark => self.schema.mark_type(capability.name()).is_some(),
            CapabilityKind::Node => self.schema.node_type(capability.name()).is_some(),
        };
        if known {
            Ok(())
        } else {
            Err(EditorError::UnknownCapability(capability.name().to_string()))
        }
    }

    fn of_kind(&self, kind: CapabilityKind) -> impl Iterator<Item = &dyn Capability> {
        self.capabilities
            .iter()
            .map(Box::as_ref)
            .filter(move |capability| capability.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{inapplicable, Command};
    use crate::plugins::{Bold, Doc, Paragraph, Text};
    use folio_model::{MarkSpec, NodeSpec};

    struct Custom {
        name: &'static str,
        fragment: SchemaFragment,
    }

    impl Capability for Custom {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> CapabilityKind {
            self.fragment.kind()
        }

        fn schema_fragment(&self) -> SchemaFragment {
            self.fragment.clone()
        }

        fn command(&self, _schema: &Schema) -> Command {
            inapplicable()
        }
    }

    #[test]
    fn test_default_registry() {
        let registry = Registry::with_defaults().unwrap();
        let marks: Vec<_> = registry.marks().map(|c| c.name()).collect();
        let nodes: Vec<_> = registry.nodes().map(|c| c.name()).collect();
        assert_eq!(marks, vec!["link", "bold", "italic"]);
        assert_eq!(
            nodes,
            vec!["text", "doc", "hard_break", "paragraph", "blockquote", "heading"]
        );
        assert_eq!(registry.schema().top_node_type().name(), "doc");
        assert_eq!(registry.input_rules().len(), 2);
    }

    #[test]
    fn test_duplicate_name_is_a_conflict() {
        let result = Registry::new(vec![Box::new(Text), Box::new(Doc), Box::new(Paragraph), Box::new(Bold), Box::new(Bold)]);
        assert!(matches!(result, Err(EditorError::SchemaConflict { name }) if name == "bold"));
    }

    #[test]
    fn test_duplicate_name_across_kinds_is_a_conflict() {
        let mark_named_paragraph = Custom {
            name: "paragraph",
            fragment: SchemaFragment::Mark(MarkSpec::default()),
        };
        let result = Registry::new(vec![
            Box::new(Text),
            Box::new(Doc),
            Box::new(Paragraph),
            Box::new(mark_named_paragraph),
        ]);
        assert!(matches!(result, Err(EditorError::SchemaConflict { .. })));
    }

    #[test]
    fn test_unknown_content_reference_is_invalid() {
        let broken = Custom {
            name: "figure",
            fragment: SchemaFragment::Node(NodeSpec {
                content: Some("caption+".into()),
                group: Some("block".into()),
                ..Default::default()
            }),
        };
        let result = Registry::new(vec![Box::new(Text), Box::new(Doc), Box::new(Paragraph), Box::new(broken)]);
        assert!(matches!(
            result,
            Err(EditorError::InvalidSchemaFragment { name, .. }) if name == "figure"
        ));
    }

    #[test]
    fn test_missing_doc_is_invalid() {
        let result = Registry::new(vec![Box::new(Text), Box::new(Paragraph)]);
        assert!(matches!(result, Err(EditorError::InvalidSchemaFragment { .. })));
    }
}
