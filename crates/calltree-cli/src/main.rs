//! calltree: print or export the static call graph of a C project.
//!
//! Without `-o` the merged call tree is printed to stdout. With `-o` one file
//! is written into the project directory:
//! - `json`  -> `calltree.json`
//! - `visjs` -> `calltree_visjs.json`
//! - `html`  -> `calltree.html`

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use calltree::{export, Config, OutputFormat};

/// Exit codes for the CLI
/// - 0: Success
/// - 2: Error (missing project, unwritable output, etc.)
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 2;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    Html,
    Json,
    Visjs,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Html => OutputFormat::Html,
            Format::Json => OutputFormat::Json,
            Format::Visjs => OutputFormat::VisJs,
        }
    }
}

/// Analyze the function call tree of a C project
#[derive(Parser)]
#[command(name = "calltree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the project source files
    project_directory: PathBuf,

    /// Output format; prints the tree to stdout when omitted
    #[arg(short = 'o', value_enum)]
    output: Option<Format>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let root = &cli.project_directory;
    let config = Config::load(root);

    let analysis = calltree::analyze(root, &config)
        .with_context(|| format!("Failed to analyze {}", root.display()))?;

    if !cli.quiet && !analysis.skipped.is_empty() {
        eprintln!(
            "Skipped {} file(s) with errors: {}",
            analysis.skipped.len(),
            analysis
                .skipped
                .iter()
                .map(|s| s.path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    match cli.output {
        None => {
            let text = export::render(&analysis.graph, OutputFormat::Text)?;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
        }
        Some(format) => {
            let format = OutputFormat::from(format);
            let path = export::save(&analysis.graph, format, root).with_context(|| {
                format!("Failed to write {} output in {}", format.describe(), root.display())
            })?;
            if !cli.quiet {
                println!("{} saved at {}", format.describe(), path.display());
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
