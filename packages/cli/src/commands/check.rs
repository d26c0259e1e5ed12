use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::Registry;
use std::path::PathBuf;

use super::read_json;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Only report, do not print the canonical document
    #[arg(short, long)]
    pub quiet: bool,
}

/// Validate a document and print its canonical form. A document that does
/// not fit the schema is reported along with the empty document it would be
/// replaced by.
pub fn check(args: CheckArgs, _cwd: &str) -> Result<()> {
    let content = read_json(&args.input)?;
    let registry = Registry::with_defaults()?;

    match registry.builder().try_build(&content) {
        Ok(doc) => {
            let canonical = doc.to_json();
            if canonical == content {
                println!("{} {}", "✓".green(), args.input.display());
            } else {
                println!("{} {} (normalized)", "✓".green(), args.input.display());
            }
            if !args.quiet {
                println!("{}", serde_json::to_string_pretty(&canonical)?);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{} {} - {}", "✗".red(), args.input.display(), err);
            if !args.quiet {
                let fallback = registry.builder().empty().to_json();
                eprintln!("  {} {}", "falls back to".yellow(), fallback);
            }
            Err(anyhow!("{} does not fit the schema", args.input.display()))
        }
    }
}
