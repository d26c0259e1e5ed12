//! # Command binding
//!
//! Once a surface is mounted, every capability's command is captured into a
//! [`BoundCommand`] and all shortcuts are merged into one table together
//! with the fixed history and navigation bindings.

use crate::commands::{redo, select_parent_node, undo, undo_input_rule, Command};
use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::keymap::{is_mac_platform, Keymap};
use crate::registry::Registry;

/// A capability command ready to run against an editor
#[derive(Debug, Clone)]
pub struct BoundCommand {
    name: String,
    command: Command,
}

impl BoundCommand {
    pub fn new(name: impl Into<String>, command: Command) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Run against the editor's current state, then re-focus the surface
    /// whether or not the command applied
    pub fn invoke(&self, editor: &mut Editor) -> EditorResult<bool> {
        let result = editor.execute(&self.command);
        editor.focus()?;
        result
    }
}

/// All bound commands plus the merged shortcut table
#[derive(Debug, Clone)]
pub struct BoundCommands {
    commands: Vec<BoundCommand>,
    keymap: Keymap,
}

impl BoundCommands {
    /// Bind every capability. The redo alias `Mod-y` is left out on Mac
    /// platforms; an unknown platform gets it.
    pub fn bind(registry: &Registry, platform: Option<&str>) -> EditorResult<Self> {
        let mac = is_mac_platform(platform);
        let mut keymap = Keymap::new(mac);

        keymap.bind("Mod-z", "undo", undo())?;
        keymap.bind("Shift-Mod-z", "redo", redo())?;
        keymap.bind("Escape", "selectParentNode", select_parent_node())?;
        keymap.bind("Backspace", "undoInputRule", undo_input_rule())?;
        if !mac {
            keymap.bind("Mod-y", "redo", redo())?;
        }

        let mut commands = Vec::new();
        for capability in registry.iter() {
            registry.check_known(capability)?;
            let command = capability.command(registry.schema());
            for key in capability.keymaps() {
                keymap.bind(key, capability.name(), command.clone())?;
            }
            commands.push(BoundCommand::new(capability.name(), command));
        }

        Ok(Self { commands, keymap })
    }

    pub fn get(&self, name: &str) -> Option<&BoundCommand> {
        self.commands.iter().find(|c| c.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundCommand> {
        self.commands.iter()
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, CapabilityKind, SchemaFragment};
    use crate::commands::inapplicable;
    use crate::errors::EditorError;
    use crate::plugins::default_capabilities;
    use folio_model::{MarkSpec, Schema};

    #[test]
    fn test_fixed_and_capability_bindings() {
        let registry = Registry::with_defaults().unwrap();
        let bound = BoundCommands::bind(&registry, Some("Linux x86_64")).unwrap();
        let keys: Vec<_> = bound.keymap().keys().map(|(k, _)| k.to_string()).collect();
        for key in [
            "Ctrl-z",
            "Ctrl-Shift-z",
            "Ctrl-y",
            "Escape",
            "Backspace",
            "Ctrl-b",
            "Ctrl-B",
            "Ctrl-i",
            "Ctrl-Enter",
            "Shift-Enter",
            "Ctrl-Shift-0",
            "Ctrl->",
            "Ctrl-Shift-1",
        ] {
            assert!(keys.contains(&key.to_string()), "missing {}", key);
        }
        assert_eq!(bound.iter().count(), 9);
        assert!(bound.get("heading").is_some());
    }

    #[test]
    fn test_mac_has_no_redo_alias() {
        let registry = Registry::with_defaults().unwrap();
        let bound = BoundCommands::bind(&registry, Some("MacIntel")).unwrap();
        assert!(bound.keymap().lookup("Meta-y").unwrap().is_none());
        assert!(bound.keymap().lookup("Mod-z").unwrap().is_some());

        let unknown = BoundCommands::bind(&registry, None).unwrap();
        assert!(unknown.keymap().lookup("Ctrl-y").unwrap().is_some());
    }

    struct Underline;

    impl Capability for Underline {
        fn name(&self) -> &str {
            "underline"
        }

        fn kind(&self) -> CapabilityKind {
            CapabilityKind::Mark
        }

        fn schema_fragment(&self) -> SchemaFragment {
            SchemaFragment::Mark(MarkSpec::default())
        }

        fn keymaps(&self) -> &[&'static str] {
            &["Mod-b"]
        }

        fn command(&self, _schema: &Schema) -> Command {
            inapplicable()
        }
    }

    #[test]
    fn test_conflicting_shortcut_fails() {
        let mut capabilities = default_capabilities();
        capabilities.push(Box::new(Underline));
        let registry = Registry::new(capabilities).unwrap();
        let err = BoundCommands::bind(&registry, None).unwrap_err();
        assert!(matches!(
            err,
            EditorError::DuplicateShortcut { ref first, ref second, .. } if first == "bold" && second == "underline"
        ));
    }
}
