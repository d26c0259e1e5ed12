//! Editing surface collaborator

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::selection::Selection;
use crate::state::EditorState;

/// The view a host mounts. It renders pushed states and forwards the user's
/// edits back to [`crate::Editor::dispatch`].
pub trait EditingSurface {
    fn update_state(&mut self, state: &EditorState);

    fn focus(&mut self);

    fn destroy(&mut self);

    /// Platform string used for shortcut normalization, if known
    fn platform(&self) -> Option<String> {
        None
    }
}

/// What a [`HeadlessSurface`] has been told
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    pub updates: usize,
    pub focus_count: usize,
    pub destroyed: bool,
    pub doc: Option<Value>,
    pub selection: Option<Selection>,
}

/// Surface without a view, recording calls into a shared log
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    platform: Option<String>,
    log: Rc<RefCell<SurfaceLog>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(platform: impl Into<String>) -> Self {
        Self {
            platform: Some(platform.into()),
            ..Self::default()
        }
    }

    /// Handle to the log that stays readable after the surface is mounted
    pub fn log(&self) -> Rc<RefCell<SurfaceLog>> {
        Rc::clone(&self.log)
    }
}

impl EditingSurface for HeadlessSurface {
    fn update_state(&mut self, state: &EditorState) {
        let mut log = self.log.borrow_mut();
        log.updates += 1;
        log.doc = Some(state.doc().to_json());
        log.selection = Some(state.selection());
    }

    fn focus(&mut self) {
        self.log.borrow_mut().focus_count += 1;
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().destroyed = true;
    }

    fn platform(&self) -> Option<String> {
        self.platform.clone()
    }
}
