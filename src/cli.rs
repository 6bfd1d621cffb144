use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::{
    aggregate::{DEFAULT_HISTOGRAM_BINS, DEFAULT_LEADERBOARD_SIZE, ReportOptions},
    data::parse_naive_date,
    filter::{DateRange, FilterSelection, RankRange},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Rank, filter and summarise click competition data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show overview metrics and the monthly clicks trend
    Summary(ReportArgs),
    /// Show the top contestants by rank and clicks by gender
    Leaderboard(ReportArgs),
    /// Show clicks by location, contestants by gender, the clicks histogram and age data
    Breakdown(ReportArgs),
    /// List the values available for each filter
    Options(OptionsArgs),
    /// Write the filtered table as CSV
    Export(ExportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Contestant data (.xlsx, .xls, .ods, .csv or .tsv); `-` reads stdin.
    /// Defaults to the sample file in the working directory
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Delimiter for text sources (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of text sources (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Earliest participation date to include
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,
    /// Latest participation date to include
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,
    /// Locations to include (repeatable or comma-separated)
    #[arg(long = "location", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub locations: Vec<String>,
    /// Genders to include (repeatable or comma-separated)
    #[arg(long = "gender", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub genders: Vec<String>,
    /// Best rank to include
    #[arg(long = "min-rank")]
    pub min_rank: Option<u32>,
    /// Worst rank to include
    #[arg(long = "max-rank")]
    pub max_rank: Option<u32>,
}

impl FilterArgs {
    /// Only the predicates given on the command line restrict the table.
    pub fn to_selection(&self) -> FilterSelection {
        let mut selection = FilterSelection::default();
        if self.from.is_some() || self.to.is_some() {
            selection = selection.with_date_range(DateRange {
                from: self.from,
                to: self.to,
            });
        }
        let locations = clean_values(&self.locations);
        if !locations.is_empty() {
            selection = selection.with_locations(locations);
        }
        let genders = clean_values(&self.genders);
        if !genders.is_empty() {
            selection = selection.with_genders(genders);
        }
        if self.min_rank.is_some() || self.max_rank.is_some() {
            selection = selection.with_rank_range(RankRange {
                min: self.min_rank,
                max: self.max_rank,
            });
        }
        selection
    }
}

fn clean_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Number of contestants on the leaderboard
    #[arg(long, default_value_t = DEFAULT_LEADERBOARD_SIZE)]
    pub top: usize,
    /// Number of bins in the clicks histogram
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,
    /// Emit all aggregates as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            leaderboard_size: self.top,
            histogram_bins: self.bins,
        }
    }
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Emit the filter domain as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_naive_date(value.trim()).ok_or_else(|| format!("'{value}' is not a recognised date"))
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
