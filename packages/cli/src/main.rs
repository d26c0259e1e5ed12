mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, diff, html, render, CheckArgs, DiffArgs, HtmlArgs, RenderArgs};
use tracing_subscriber::EnvFilter;

/// Folio CLI - inspect, convert and diff rich-text documents
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a document and print its canonical form
    Check(CheckArgs),

    /// Convert HTML into a document
    Html(HtmlArgs),

    /// Render a document as HTML
    Render(RenderArgs),

    /// Derive the operations between two documents
    Diff(DiffArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Check(args) => check(args, &cwd),
        Command::Html(args) => html(args, &cwd),
        Command::Render(args) => render(args, &cwd),
        Command::Diff(args) => diff(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
