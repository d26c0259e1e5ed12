//! # Editor driver
//!
//! Owns the registry, the current state and the mounted surface. Every
//! transaction goes through [`reconcile`]; the driver stores the result,
//! pushes it to the surface and calls the host's hooks.

use folio_html::HtmlParser;
use folio_model::{DomParser, Node};
use folio_transform::DocumentDiff;
use serde_json::Value;
use tracing::{debug, info};

use crate::binder::{BoundCommand, BoundCommands};
use crate::capability::Capability;
use crate::commands::{text_input_transaction, Command};
use crate::config::EditorConfig;
use crate::errors::{EditorError, EditorResult};
use crate::input_rules::InputRule;
use crate::keymap::{base_keymap, is_mac_platform, Keymap};
use crate::plugins::default_capabilities;
use crate::reconcile::reconcile;
use crate::registry::Registry;
use crate::state::{EditorState, Transaction};
use crate::surface::EditingSurface;
use crate::toolbar::{project, ActivationSnapshot, ToolbarEntry};

type ContentHook = Box<dyn FnMut(&Value)>;
type ToolbarHook = Box<dyn FnMut(&[ToolbarEntry])>;
type DiffHook = Box<dyn FnMut(&DocumentDiff)>;

#[derive(Default)]
struct Hooks {
    content: Option<ContentHook>,
    toolbar: Option<ToolbarHook>,
    diff: Option<DiffHook>,
}

/// Bindings that exist only while a surface is mounted
struct Mounted {
    surface: Box<dyn EditingSurface>,
    commands: BoundCommands,
    base_keymap: Keymap,
}

pub struct Editor {
    registry: Registry,
    config: EditorConfig,
    dom_parser: Box<dyn DomParser>,
    state: EditorState,
    input_rules: Vec<InputRule>,
    activation: ActivationSnapshot,
    mounted: Option<Mounted>,
    hooks: Hooks,
}

impl Editor {
    /// Assemble the schema from `capabilities` and build the initial
    /// document from `content`. Invalid content gives the empty document.
    pub fn new(
        capabilities: Vec<Box<dyn Capability>>,
        content: Option<&Value>,
        config: EditorConfig,
    ) -> EditorResult<Self> {
        let registry = Registry::new(capabilities)?;
        let doc = registry.builder().build(content);
        let state = EditorState::new(registry.schema().clone(), doc, config.history_depth);
        let activation = ActivationSnapshot::compute(&registry, &state)?;
        let input_rules = registry.input_rules();

        Ok(Self {
            registry,
            config,
            dom_parser: Box::new(HtmlParser::new()),
            state,
            input_rules,
            activation,
            mounted: None,
            hooks: Hooks::default(),
        })
    }

    /// Editor with the built-in capabilities
    pub fn with_defaults(content: Option<&Value>, config: EditorConfig) -> EditorResult<Self> {
        Self::new(default_capabilities(), content, config)
    }

    /// Replace the markup parser used by [`Self::set_content_html`]
    pub fn with_dom_parser(mut self, parser: impl DomParser + 'static) -> Self {
        self.dom_parser = Box::new(parser);
        self
    }

    pub fn on_content_change(&mut self, hook: impl FnMut(&Value) + 'static) {
        self.hooks.content = Some(Box::new(hook));
    }

    pub fn on_toolbar_change(&mut self, hook: impl FnMut(&[ToolbarEntry]) + 'static) {
        self.hooks.toolbar = Some(Box::new(hook));
    }

    pub fn on_diff(&mut self, hook: impl FnMut(&DocumentDiff) + 'static) {
        self.hooks.diff = Some(Box::new(hook));
    }

    /// Bind `surface`, capture every capability command and announce the
    /// initial content and toolbar
    pub fn mount(&mut self, mut surface: Box<dyn EditingSurface>) -> EditorResult<()> {
        let platform = surface.platform().or_else(|| self.config.platform.clone());
        let commands = BoundCommands::bind(&self.registry, platform.as_deref())?;
        let base_keymap = base_keymap(is_mac_platform(platform.as_deref()))?;

        if let Some(mut previous) = self.mounted.take() {
            previous.surface.destroy();
        }
        surface.update_state(&self.state);
        self.mounted = Some(Mounted {
            surface,
            commands,
            base_keymap,
        });
        info!(platform = platform.as_deref().unwrap_or("unknown"), "surface mounted");

        self.activation = ActivationSnapshot::compute(&self.registry, &self.state)?;
        let content = self.state.doc().to_json();
        if let Some(hook) = self.hooks.content.as_mut() {
            hook(&content);
        }
        self.notify_toolbar();
        Ok(())
    }

    /// Run one reconcile cycle for `tr`
    pub fn dispatch(&mut self, tr: Transaction) -> EditorResult<()> {
        if self.mounted.is_none() {
            return Err(EditorError::NoActiveSurface);
        }

        let result = reconcile(&self.registry, &self.state, tr, &self.config.diff)?;
        self.state = result.state;
        self.activation = result.activation;
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.surface.update_state(&self.state);
        }

        if let Some(content) = &result.content {
            if let Some(hook) = self.hooks.content.as_mut() {
                hook(content);
            }
        }
        if let Some(diff) = &result.diff {
            if let Some(hook) = self.hooks.diff.as_mut() {
                hook(diff);
            }
        }
        self.notify_toolbar();
        Ok(())
    }

    /// Run `command` against the current state, dispatching what it
    /// produces. Returns whether it applied.
    pub fn execute(&mut self, command: &Command) -> EditorResult<bool> {
        if self.mounted.is_none() {
            return Err(EditorError::NoActiveSurface);
        }
        let mut buffer = Vec::new();
        let applied = command.run(&self.state, Some(&mut buffer));
        for tr in buffer {
            self.dispatch(tr)?;
        }
        Ok(applied)
    }

    pub fn focus(&mut self) -> EditorResult<()> {
        let mounted = self.mounted.as_mut().ok_or(EditorError::NoActiveSurface)?;
        mounted.surface.focus();
        Ok(())
    }

    /// Resolve `key` through the shortcut table, then the base keymap.
    /// Returns whether a command handled it.
    pub fn handle_key(&mut self, key: &str) -> EditorResult<bool> {
        let mounted = self.mounted.as_ref().ok_or(EditorError::NoActiveSurface)?;
        let primary = mounted.commands.keymap().lookup(key)?.cloned();
        let base = mounted.base_keymap.lookup(key)?.cloned();

        for command in primary.into_iter().chain(base) {
            if self.execute(&command)? {
                debug!(key, "key handled");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Type `text` at the selection, letting input rules claim it first
    pub fn handle_text_input(&mut self, text: &str) -> EditorResult<()> {
        if self.mounted.is_none() {
            return Err(EditorError::NoActiveSurface);
        }
        let tr = text_input_transaction(&self.state, &self.input_rules, text)?;
        self.dispatch(tr)
    }

    /// Replace the document when `content` differs from the current one.
    /// History starts over and no hooks fire.
    pub fn set_content(&mut self, content: &Value) -> EditorResult<bool> {
        if self.mounted.is_none() {
            return Err(EditorError::NoActiveSurface);
        }
        if *content == self.state.doc().to_json() {
            return Ok(false);
        }
        let doc = self.registry.builder().build(Some(content));
        self.reset(doc)?;
        Ok(true)
    }

    /// Like [`Self::set_content`], parsing `markup` first
    pub fn set_content_html(&mut self, markup: &str) -> EditorResult<bool> {
        if self.mounted.is_none() {
            return Err(EditorError::NoActiveSurface);
        }
        let doc = self
            .registry
            .builder()
            .build_html(self.dom_parser.as_ref(), markup);
        if doc == *self.state.doc() {
            return Ok(false);
        }
        self.reset(doc)?;
        Ok(true)
    }

    /// Release the surface and its bindings
    pub fn destroy(&mut self) {
        if let Some(mut mounted) = self.mounted.take() {
            mounted.surface.destroy();
            info!("surface destroyed");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Serialized current document
    pub fn content(&self) -> Value {
        self.state.doc().to_json()
    }

    pub fn html(&self) -> EditorResult<String> {
        Ok(folio_html::to_html(self.state.doc())?)
    }

    pub fn activation(&self) -> &ActivationSnapshot {
        &self.activation
    }

    /// Current toolbar projection; empty until a surface is mounted
    pub fn toolbar(&self) -> Vec<ToolbarEntry> {
        match &self.mounted {
            Some(mounted) => project(&self.registry, &self.activation, &mounted.commands),
            None => Vec::new(),
        }
    }

    /// Bound command of the capability named `name`
    pub fn command(&self, name: &str) -> Option<BoundCommand> {
        self.mounted.as_ref()?.commands.get(name).cloned()
    }

    fn reset(&mut self, doc: Node) -> EditorResult<()> {
        self.state = EditorState::new(self.registry.schema().clone(), doc, self.config.history_depth);
        self.activation = ActivationSnapshot::compute(&self.registry, &self.state)?;
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.surface.update_state(&self.state);
        }
        debug!("content replaced");
        Ok(())
    }

    fn notify_toolbar(&mut self) {
        if self.hooks.toolbar.is_none() {
            return;
        }
        let entries = self.toolbar();
        if let Some(hook) = self.hooks.toolbar.as_mut() {
            hook(&entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use serde_json::json;

    #[test]
    fn test_requires_surface() {
        let mut editor = Editor::with_defaults(None, EditorConfig::default()).unwrap();
        let tr = editor.state().tr();
        assert!(matches!(editor.dispatch(tr), Err(EditorError::NoActiveSurface)));
        assert!(matches!(
            editor.set_content(&json!({"type": "doc"})),
            Err(EditorError::NoActiveSurface)
        ));
        assert!(matches!(editor.focus(), Err(EditorError::NoActiveSurface)));
        assert!(editor.toolbar().is_empty());
    }

    #[test]
    fn test_mount_pushes_state() {
        let mut editor = Editor::with_defaults(None, EditorConfig::default()).unwrap();
        let surface = HeadlessSurface::new();
        let log = surface.log();
        editor.mount(Box::new(surface)).unwrap();

        assert_eq!(log.borrow().updates, 1);
        assert_eq!(log.borrow().doc, Some(json!({"type": "doc", "content": [{"type": "paragraph"}]})));
        assert_eq!(editor.toolbar().len(), 6);

        editor.destroy();
        assert!(log.borrow().destroyed);
        assert!(!editor.is_mounted());
    }

    #[test]
    fn test_invoke_focuses_even_when_inapplicable() {
        let mut editor = Editor::with_defaults(None, EditorConfig::default()).unwrap();
        let surface = HeadlessSurface::new();
        let log = surface.log();
        editor.mount(Box::new(surface)).unwrap();

        let doc_command = editor.command("doc").unwrap();
        assert!(!doc_command.invoke(&mut editor).unwrap());
        assert_eq!(log.borrow().focus_count, 1);

        let heading = editor.command("heading").unwrap();
        assert!(heading.invoke(&mut editor).unwrap());
        assert_eq!(log.borrow().focus_count, 2);
        assert_eq!(editor.state().doc().child(0).type_name(), "heading");
    }
}
