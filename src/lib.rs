pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod columns;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod export;
pub mod filter;
pub mod io_utils;
pub mod normalize;
pub mod report;
pub mod source;
pub mod table;

use std::{env, io::Write, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

pub use crate::{
    aggregate::{Aggregates, ReportOptions, filter_and_aggregate, filter_and_aggregate_with},
    error::{EmptyResult, IngestionError},
    filter::{FilterSelection, FilteredTable},
    normalize::{ContestantRecord, NormalizedTable, normalize, normalize_with},
};

use crate::{
    cli::{Cli, Commands, ExportArgs, SourceArgs},
    dashboard::Dashboard,
    report::View,
    source::IngestOptions,
};

/// Used when no input is given.
pub const SAMPLE_FILE_PATH: &str = "click-dashboard-mock-data.xlsx";

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("click_dashboard", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Summary(args) => report::execute(View::Summary, &args),
        Commands::Leaderboard(args) => report::execute(View::Leaderboard, &args),
        Commands::Breakdown(args) => report::execute(View::Breakdown, &args),
        Commands::Options(args) => report::execute_options(&args),
        Commands::Export(args) => handle_export(&args),
    }
}

fn resolve_input(source: &SourceArgs) -> Result<PathBuf> {
    if let Some(path) = &source.input {
        return Ok(path.clone());
    }
    let sample = PathBuf::from(SAMPLE_FILE_PATH);
    if sample.exists() {
        info!("No input given; using sample data from {sample:?}");
        Ok(sample)
    } else {
        bail!("Sample file {SAMPLE_FILE_PATH} not found. Provide a data file with --input.")
    }
}

/// Reads the configured source and builds a session around it.
pub(crate) fn load_source(
    source: &SourceArgs,
    report: ReportOptions,
) -> Result<(Dashboard, Vec<u8>)> {
    let path = resolve_input(source)?;
    let ingest = IngestOptions {
        delimiter: io_utils::resolve_input_delimiter(&path, source.delimiter),
        encoding: io_utils::resolve_encoding(source.input_encoding.as_deref())?,
    };
    info!(
        "Reading '{}' (delimiter '{}', encoding {})",
        path.display(),
        printable_delimiter(ingest.delimiter),
        ingest.encoding.name()
    );
    let bytes = io_utils::read_source_bytes(&path)?;
    Ok((Dashboard::new(ingest, report), bytes))
}

fn handle_export(args: &ExportArgs) -> Result<()> {
    let (mut dashboard, bytes) = load_source(&args.source, ReportOptions::default())?;
    let table = dashboard.load(&bytes).context("Loading contestant data")?;
    let selection = args.filters.to_selection();
    debug!("Export selection: {selection:?}");
    let filtered = match selection.apply(&table) {
        Ok(filtered) => filtered,
        Err(empty) => {
            warn!("{empty}");
            return Ok(());
        }
    };
    let csv = dashboard.download_csv(&filtered)?;
    let mut output = io_utils::open_output(args.output.as_deref())?;
    output.write_all(&csv).context("Writing CSV export")?;
    output.flush().context("Flushing CSV export")?;
    info!(
        "Exported {} row(s) to {}",
        filtered.len(),
        args.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into())
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
