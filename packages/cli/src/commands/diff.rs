use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{EditorConfig, Registry};
use folio_transform::{recreate_transform, DiffOp, DocumentDiff, RecreateOptions};
use std::path::PathBuf;
use tracing::debug;

use super::read_json;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Document before the edit
    pub before: PathBuf,

    /// Document after the edit
    pub after: PathBuf,

    /// Grow text changes to whole words
    #[arg(long)]
    pub words: bool,

    /// Describe mark changes as replacements
    #[arg(long)]
    pub replace_only: bool,

    /// Print the diff as JSON
    #[arg(long)]
    pub json: bool,
}

/// Derive the operations that turn one document into another. Defaults come
/// from `folio.config.json` in the working directory; flags override them.
pub fn diff(args: DiffArgs, cwd: &str) -> Result<()> {
    let config = EditorConfig::load(cwd)?;
    let registry = Registry::with_defaults()?;
    let before = registry.builder().build(Some(&read_json(&args.before)?));
    let after = registry.builder().build(Some(&read_json(&args.after)?));

    let mut options: RecreateOptions = config.diff.into();
    options.word_granularity |= args.words;
    if args.replace_only {
        options.allow_non_replace_steps = false;
    }
    debug!(?options, "deriving diff");

    let tr = recreate_transform(&before, &after, options)?;
    let diff = DocumentDiff::from_transform(&tr);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
        return Ok(());
    }

    if diff.ops.is_empty() {
        println!("{}", "No changes".dimmed());
        return Ok(());
    }
    for op in &diff.ops {
        println!("  {}", describe(op));
    }
    println!();
    println!(
        "{} {} operation(s), {} changed range(s)",
        "✓".green(),
        diff.ops.len(),
        diff.changes.len()
    );
    Ok(())
}

fn describe(op: &DiffOp) -> String {
    match op {
        DiffOp::Insert { at, content } => format!("{} at {}: {}", "insert".green(), at, content),
        DiffOp::Delete { from, to } => format!("{} {}..{}", "delete".red(), from, to),
        DiffOp::Replace { from, to, content } => format!("{} {}..{}: {}", "replace".yellow(), from, to, content),
        DiffOp::AddMark { from, to, mark } => format!("{} {}..{}: {}", "add mark".cyan(), from, to, mark),
        DiffOp::RemoveMark { from, to, mark } => format!("{} {}..{}: {}", "remove mark".magenta(), from, to, mark),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_ops() {
        let insert = DiffOp::Insert {
            at: 3,
            content: json!({"content": [{"type": "text", "text": "!"}]}),
        };
        colored::control::set_override(false);
        assert_eq!(
            describe(&insert),
            r#"insert at 3: {"content":[{"type":"text","text":"!"}]}"#
        );
        assert_eq!(describe(&DiffOp::Delete { from: 1, to: 4 }), "delete 1..4");
    }
}
