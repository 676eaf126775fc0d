//! # rxsage
//!
//! Terminal prescription editor with fuzzy catalog suggestions.

mod app;
mod cli;
mod table;
mod tui;

use clap::Parser;
use rxsage::catalog::{
    CatalogSchema, CatalogSource, DEFAULT_THRESHOLD, IndexOptions, MEDICINE, PROCEDURE,
};
use rxsage::suggest::{MAX_RESULTS, MIN_TOKEN_CHARS, SuggestConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default match cutoff for table cells.
const CELL_THRESHOLD: f64 = 0.4;

/// rxsage — prescription editor with catalog suggestions
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rxsage",
    version,
    about = "rxsage — prescription editor with fuzzy medicine and procedure suggestions"
)]
pub struct Args {
    /// Medicine catalog (JSON array of rows)
    #[arg(short = 'm', long = "medicines")]
    pub medicines: Option<PathBuf>,

    /// Lab / procedure catalog (JSON array of rows)
    #[arg(short = 'p', long = "procedures")]
    pub procedures: Option<PathBuf>,

    /// Label field in medicine rows
    #[arg(long = "medicine-label", default_value = "medicine_desc")]
    pub medicine_label: String,

    /// Label field in procedure rows
    #[arg(long = "procedure-label", default_value = "medicine_desc")]
    pub procedure_label: String,

    /// Code field in catalog rows
    #[arg(long = "code-field", default_value = "sku_code")]
    pub code_field: String,

    /// Match cutoff on a 0..1 scale, 0 = exact
    #[arg(long = "threshold", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Match cutoff for table cells
    #[arg(long = "cell-threshold", default_value_t = CELL_THRESHOLD)]
    pub cell_threshold: f64,

    /// Maximum suggestions in the text editor
    #[arg(long = "limit", default_value_t = MAX_RESULTS)]
    pub limit: usize,

    /// Maximum suggestions in a table cell
    #[arg(long = "cell-limit", default_value_t = 5)]
    pub cell_limit: usize,

    /// Saved prescription to open (raw text, medicines and investigations)
    #[arg(long = "open")]
    pub open: Option<PathBuf>,

    /// Advice text shown with F2
    #[arg(long = "advice")]
    pub advice: Option<PathBuf>,

    /// Non-interactive CLI mode
    #[arg(long = "cli")]
    pub cli_mode: bool,

    /// Read prescription lines from file (CLI mode)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Write suggestions (CLI) or the saved prescription (TUI) to file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format: table, csv, json
    #[arg(long = "format", default_value = "table")]
    pub format: String,

    /// Write logs to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Catalog sources named on the command line, each with its mapping.
    pub fn catalog_sources(&self) -> Vec<CatalogSource> {
        let mut sources = Vec::new();
        if let Some(path) = &self.medicines {
            sources.push(CatalogSource::new(
                path.clone(),
                CatalogSchema::new(&self.medicine_label, Some(self.code_field.as_str()), MEDICINE),
            ));
        }
        if let Some(path) = &self.procedures {
            sources.push(CatalogSource::new(
                path.clone(),
                CatalogSchema::new(&self.procedure_label, Some(self.code_field.as_str()), PROCEDURE),
            ));
        }
        sources
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            threshold: self.threshold.clamp(0.0, 1.0),
        }
    }

    /// Options for the per-table catalog subsets.
    pub fn cell_options(&self) -> IndexOptions {
        IndexOptions {
            threshold: self.cell_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn editor_config(&self) -> SuggestConfig {
        SuggestConfig {
            min_token_chars: MIN_TOKEN_CHARS,
            max_results: self.limit,
        }
    }

    pub fn cell_config(&self) -> SuggestConfig {
        SuggestConfig {
            min_token_chars: MIN_TOKEN_CHARS,
            max_results: self.cell_limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Determine if we should run in CLI mode:
    // --cli flag, piped stdin, or -i flag
    let is_piped = atty_check();
    let cli_mode = args.cli_mode || is_piped || args.input.is_some();
    init_tracing(&args, cli_mode)?;

    if cli_mode {
        cli::run(args).await?;
    } else {
        tui::run(args).await?;
    }

    Ok(())
}

/// Logs go to `--log-file` when given. Otherwise CLI mode logs to stderr and
/// the TUI stays silent so the screen is not corrupted.
fn init_tracing(args: &Args, cli_mode: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rxsage=info"))
    };
    if let Some(path) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else if cli_mode {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

/// Check if stdin is NOT a terminal (i.e. input is piped).
fn atty_check() -> bool {
    use std::io::IsTerminal;
    !std::io::stdin().is_terminal()
}
