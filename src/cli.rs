use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::indicators::Indicator;
use crate::portfolio::Weighting;

#[derive(Debug, Parser)]
#[command(name = "stock-dash")]
#[command(about = "Fetch daily stock prices and company profiles and compute technical indicators")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Provider API key (overrides config and ALPHAVANTAGE_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Price history length: compact or full
    #[arg(long, global = true)]
    pub output_size: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the company profile for a symbol
    Overview { symbol: String },

    /// Compute an indicator over daily closes and print the latest rows
    Technical {
        symbol: String,

        /// sma, ema, macd, rsi or bollinger
        #[arg(short, long, default_value = "sma", value_parser = parse_indicator)]
        indicator: Indicator,

        /// Look-back window (ignored by macd)
        #[arg(short, long)]
        window: Option<usize>,

        /// Number of most recent rows to print
        #[arg(short, long, default_value_t = 10)]
        rows: usize,

        /// Read bars from a CSV written by `export` instead of the provider
        #[arg(long)]
        from_csv: Option<PathBuf>,
    },

    /// Split an investment across symbols and price the positions
    Allocate {
        #[arg(required = true)]
        symbols: Vec<String>,

        #[arg(short, long)]
        amount: f64,

        /// Comma-separated percentages, one per symbol; equal split when omitted
        #[arg(short, long, value_parser = parse_weighting)]
        weights: Option<Weighting>,
    },

    /// Write daily bars plus indicator columns to a CSV file
    Export {
        symbol: String,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_parser = parse_indicator)]
        indicator: Vec<Indicator>,

        #[arg(short, long)]
        window: Option<usize>,
    },
}

fn parse_indicator(raw: &str) -> Result<Indicator, String> {
    raw.parse::<Indicator>().map_err(|e| e.to_string())
}

fn parse_weighting(raw: &str) -> Result<Weighting, String> {
    raw.parse::<Weighting>().map_err(|e| e.to_string())
}
