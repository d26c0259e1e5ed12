pub mod check;
pub mod diff;
pub mod html;
pub mod render;

pub use check::{check, CheckArgs};
pub use diff::{diff, DiffArgs};
pub use html::{html, HtmlArgs};
pub use render::{render, RenderArgs};

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let source = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("{} is not valid JSON", path.display()))
}
