use anyhow::{Context, Result};
use clap::Args;
use folio_editor::Registry;
use folio_html::HtmlParser;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HtmlArgs {
    /// HTML file to convert
    pub input: PathBuf,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

/// Parse markup into a document and print it as JSON
pub fn html(args: HtmlArgs, _cwd: &str) -> Result<()> {
    let markup = fs::read_to_string(&args.input).with_context(|| format!("Cannot read {}", args.input.display()))?;
    let registry = Registry::with_defaults()?;
    let doc = registry.builder().build_html(&HtmlParser::new(), &markup);

    let json = doc.to_json();
    if args.compact {
        println!("{}", serde_json::to_string(&json)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(())
}
