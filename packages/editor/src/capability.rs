//! # Capabilities
//!
//! A capability is one pluggable unit of the editor: a mark (bold, link) or
//! a node (paragraph, heading). Each one contributes its schema fragment, the
//! command it runs, its shortcuts and, optionally, input rules.

use folio_model::{MarkSpec, NodeSpec, Schema};

use crate::commands::Command;
use crate::input_rules::InputRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Mark,
    Node,
}

/// Schema definition contributed by a capability
#[derive(Debug, Clone)]
pub enum SchemaFragment {
    Mark(MarkSpec),
    Node(NodeSpec),
}

impl SchemaFragment {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            SchemaFragment::Mark(_) => CapabilityKind::Mark,
            SchemaFragment::Node(_) => CapabilityKind::Node,
        }
    }
}

pub trait Capability {
    /// Unique across all registered capabilities, marks and nodes alike
    fn name(&self) -> &str;

    fn kind(&self) -> CapabilityKind;

    fn schema_fragment(&self) -> SchemaFragment;

    /// Shortcuts that run [`Capability::command`]
    fn keymaps(&self) -> &[&'static str] {
        &[]
    }

    /// The command this capability performs. Must depend only on `schema`,
    /// so it can be built repeatedly and bound to several triggers.
    fn command(&self, schema: &Schema) -> Command;

    fn in_toolbar(&self) -> bool {
        false
    }

    fn input_rules(&self, _schema: &Schema) -> Vec<InputRule> {
        Vec::new()
    }
}
