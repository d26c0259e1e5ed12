//! # Folio Editor
//!
//! Editor state core: capability registry, immutable editor state with
//! history, commands and keymaps, and the reconcile cycle that turns each
//! transaction into the next state plus host notifications.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ capabilities → Registry (schema + builder)  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Editor: state + mounted surface             │
//! │  - keys → BoundCommands / base keymap       │
//! │  - text → input rules → Transaction         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ reconcile: apply → detect → diff → activate │
//! │  - content / diff / toolbar hooks           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{Editor, EditorConfig, HeadlessSurface};
//!
//! let mut editor = Editor::with_defaults(Some(&content), EditorConfig::default())?;
//! editor.on_content_change(|doc| println!("{}", doc));
//! editor.mount(Box::new(HeadlessSurface::new()))?;
//!
//! editor.handle_text_input("!")?;
//! editor.handle_key("Mod-z")?;
//! ```

mod binder;
mod capability;
mod commands;
mod config;
mod document;
mod editor;
mod errors;
mod history;
mod input_rules;
mod keymap;
pub mod plugins;
mod reconcile;
mod registry;
mod selection;
mod state;
mod surface;
mod toolbar;

pub use binder::{BoundCommand, BoundCommands};
pub use capability::{Capability, CapabilityKind, SchemaFragment};
pub use commands::{
    chain, delete_char_backward, delete_char_forward, delete_selection, inapplicable, insert_node, join_backward,
    join_forward, lift_empty_block, redo, select_all, select_parent_node, set_block_type, split_block,
    toggle_block_type, toggle_mark, undo, undo_input_rule, wrap_in, Command,
};
pub use config::{DiffOptions, EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::{empty_document_json, DocumentBuilder};
pub use editor::Editor;
pub use errors::{EditorError, EditorResult};
pub use history::{History, HistoryAction, HistoryEntry};
pub use input_rules::{blockquote_match, heading_match, AppliedInputRule, InputRule, RuleAction, RuleMatch};
pub use keymap::{base_keymap, is_mac_platform, normalize_key_name, Keymap};
pub use reconcile::{reconcile, Reconciliation};
pub use registry::Registry;
pub use selection::{nearest_cursor, Selection};
pub use state::{EditorState, Transaction};
pub use surface::{EditingSurface, HeadlessSurface, SurfaceLog};
pub use toolbar::{project, ActivationSnapshot, ToolbarEntry};

#[cfg(test)]
pub(crate) mod test_support {
    use folio_model::Node;
    use serde_json::Value;

    use crate::registry::Registry;

    pub fn registry() -> Registry {
        Registry::with_defaults().expect("default capabilities assemble")
    }

    pub fn doc_from(registry: &Registry, content: Value) -> Node {
        let doc = registry.schema().node_from_json(&content).expect("valid test document");
        doc.check().expect("test document fits the schema");
        doc
    }
}
