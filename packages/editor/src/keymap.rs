//! # Keymaps
//!
//! Shortcut names like `Shift-Mod-z` are normalized before they are stored
//! or looked up: `Mod` becomes `Meta` on Mac platforms and `Ctrl` elsewhere,
//! and modifiers are ordered `Alt-Ctrl-Meta-Shift`.

use std::collections::BTreeMap;

use crate::commands::{
    chain, delete_char_backward, delete_char_forward, delete_selection, join_backward, join_forward,
    lift_empty_block, select_all, split_block, Command,
};
use crate::errors::{EditorError, EditorResult};

/// Whether a platform string names an Apple platform. Unknown platforms are
/// not Mac.
pub fn is_mac_platform(platform: Option<&str>) -> bool {
    platform
        .map(|p| p.contains("Mac") || p.contains("iPhone") || p.contains("iPad") || p.contains("iPod"))
        .unwrap_or(false)
}

pub fn normalize_key_name(name: &str, mac: bool) -> EditorResult<String> {
    let mut parts: Vec<&str> = name.split('-').collect();
    let mut key = parts.pop().unwrap_or_default();
    if key.is_empty() {
        key = "-";
        parts.pop();
    }
    if key == "Space" {
        key = " ";
    }

    let (mut alt, mut ctrl, mut meta, mut shift) = (false, false, false, false);
    for modifier in parts {
        match modifier.to_ascii_lowercase().as_str() {
            "cmd" | "meta" | "m" => meta = true,
            "a" | "alt" => alt = true,
            "c" | "ctrl" | "control" => ctrl = true,
            "s" | "shift" => shift = true,
            "mod" if mac => meta = true,
            "mod" => ctrl = true,
            _ => return Err(EditorError::InvalidShortcut(name.to_string())),
        }
    }

    let mut normalized = String::new();
    for (on, prefix) in [(alt, "Alt-"), (ctrl, "Ctrl-"), (meta, "Meta-"), (shift, "Shift-")] {
        if on {
            normalized.push_str(prefix);
        }
    }
    normalized.push_str(key);
    Ok(normalized)
}

#[derive(Debug, Clone)]
struct Binding {
    owner: String,
    command: Command,
}

/// Table from normalized shortcut to command
#[derive(Debug, Clone)]
pub struct Keymap {
    mac: bool,
    bindings: BTreeMap<String, Binding>,
}

impl Keymap {
    pub fn new(mac: bool) -> Self {
        Self {
            mac,
            bindings: BTreeMap::new(),
        }
    }

    /// Bind `key` for `owner`. A key already bound fails with
    /// `DuplicateShortcut`, naming both owners.
    pub fn bind(&mut self, key: &str, owner: &str, command: Command) -> EditorResult<()> {
        let normalized = normalize_key_name(key, self.mac)?;
        if let Some(existing) = self.bindings.get(&normalized) {
            return Err(EditorError::DuplicateShortcut {
                key: normalized,
                first: existing.owner.clone(),
                second: owner.to_string(),
            });
        }
        self.bindings.insert(
            normalized,
            Binding {
                owner: owner.to_string(),
                command,
            },
        );
        Ok(())
    }

    /// Command bound to `key`, which is normalized first
    pub fn lookup(&self, key: &str) -> EditorResult<Option<&Command>> {
        let normalized = normalize_key_name(key, self.mac)?;
        Ok(self.bindings.get(&normalized).map(|b| &b.command))
    }

    /// Normalized keys with the name of whoever bound them
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(key, binding)| (key.as_str(), binding.owner.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Low-priority editing keys, consulted when the primary table has no
/// binding or its command does not apply
pub fn base_keymap(mac: bool) -> EditorResult<Keymap> {
    let mut keymap = Keymap::new(mac);
    keymap.bind("Enter", "base", chain(vec![lift_empty_block(), split_block()]))?;
    keymap.bind(
        "Backspace",
        "base",
        chain(vec![delete_selection(), join_backward(), delete_char_backward()]),
    )?;
    keymap.bind(
        "Delete",
        "base",
        chain(vec![delete_selection(), join_forward(), delete_char_forward()]),
    )?;
    keymap.bind("Mod-a", "base", select_all())?;
    Ok(keymap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::inapplicable;

    #[test]
    fn test_normalize_modifier_order() {
        assert_eq!(normalize_key_name("Shift-Mod-z", false).unwrap(), "Ctrl-Shift-z");
        assert_eq!(normalize_key_name("Shift-Mod-z", true).unwrap(), "Meta-Shift-z");
        assert_eq!(normalize_key_name("Shift-Ctrl-0", false).unwrap(), "Ctrl-Shift-0");
        assert_eq!(normalize_key_name("alt-shift-ctrl-x", false).unwrap(), "Alt-Ctrl-Shift-x");
    }

    #[test]
    fn test_normalize_special_keys() {
        assert_eq!(normalize_key_name("Ctrl->", false).unwrap(), "Ctrl->");
        assert_eq!(normalize_key_name("Ctrl--", false).unwrap(), "Ctrl--");
        assert_eq!(normalize_key_name("-", false).unwrap(), "-");
        assert_eq!(normalize_key_name("Mod-Space", true).unwrap(), "Meta- ");
        assert!(matches!(
            normalize_key_name("Hyper-x", false),
            Err(EditorError::InvalidShortcut(_))
        ));
    }

    #[test]
    fn test_platform_detection() {
        assert!(is_mac_platform(Some("MacIntel")));
        assert!(is_mac_platform(Some("iPhone")));
        assert!(!is_mac_platform(Some("Linux x86_64")));
        assert!(!is_mac_platform(None));
    }

    #[test]
    fn test_duplicate_after_normalization() {
        let mut keymap = Keymap::new(false);
        keymap.bind("Mod-b", "bold", inapplicable()).unwrap();
        let err = keymap.bind("Ctrl-b", "other", inapplicable()).unwrap_err();
        assert!(matches!(
            err,
            EditorError::DuplicateShortcut { ref key, ref first, ref second }
                if key == "Ctrl-b" && first == "bold" && second == "other"
        ));
    }

    #[test]
    fn test_case_distinguishes_keys() {
        let mut keymap = Keymap::new(false);
        keymap.bind("Mod-b", "bold", inapplicable()).unwrap();
        keymap.bind("Mod-B", "bold", inapplicable()).unwrap();
        assert_eq!(keymap.len(), 2);
        assert!(keymap.lookup("Ctrl-B").unwrap().is_some());
        assert!(keymap.lookup("Ctrl-x").unwrap().is_none());
    }
}
