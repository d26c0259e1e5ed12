use anyhow::Result;
use clap::Args;
use folio_editor::Registry;
use folio_html::to_html;
use std::path::PathBuf;

use super::read_json;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Document JSON file
    pub input: PathBuf,
}

/// Render a document to HTML. Content that does not fit the schema renders
/// as the empty document.
pub fn render(args: RenderArgs, _cwd: &str) -> Result<()> {
    let content = read_json(&args.input)?;
    let registry = Registry::with_defaults()?;
    let doc = registry.builder().build(Some(&content));
    println!("{}", to_html(&doc)?);
    Ok(())
}
