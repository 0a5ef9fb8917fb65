//! Stock Screen CLI
//!
//! Classifies a ticker as Deep Value, Value and/or Growth from its
//! fundamentals and prints the evaluation table.
//!
//! # Usage
//!
//! ```bash
//! # Optional secondary source
//! export ALPHA_VANTAGE_API_KEY="your-key"
//!
//! cargo run --bin stock-screen -- MSFT
//! cargo run --bin stock-screen -- --interactive
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use screen_core::{
    CachedSource, Formatter, FormatterFactory, Metric, MetricValue, OutputFormat, PlaceholderMode,
    RuleTable, ScreenConfig, Screener, YahooFinanceClient,
};
use screen_utils::LogFormat;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-screen")]
#[command(about = "Classify a stock as Deep Value, Value or Growth", long_about = None)]
struct Args {
    /// Ticker symbol to screen
    #[arg(default_value = "AAPL")]
    ticker: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// How to fill metrics that have no live data source
    #[arg(long, value_enum, default_value_t = Placeholders::Absent)]
    placeholders: Placeholders,

    /// Value for a metric with no live source, e.g. `moat=true` (repeatable)
    #[arg(long = "set", value_name = "METRIC=VALUE", value_parser = parse_override)]
    overrides: Vec<(Metric, MetricValue)>,

    /// JSON rule table replacing the standard thresholds
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Raw debt/equity values above this are read as percentages
    #[arg(long, value_name = "N")]
    de_threshold: Option<f64>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Read tickers from stdin, one per line
    #[arg(short, long)]
    interactive: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogStyle::Pretty)]
    log_format: LogStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Table => OutputFormat::Table,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Placeholders {
    /// Leave them empty
    Absent,
    /// Use the legacy fixed constants
    Legacy,
}

impl From<Placeholders> for PlaceholderMode {
    fn from(placeholders: Placeholders) -> Self {
        match placeholders {
            Placeholders::Absent => PlaceholderMode::Absent,
            Placeholders::Legacy => PlaceholderMode::Legacy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogStyle {
    Pretty,
    Json,
}

impl From<LogStyle> for LogFormat {
    fn from(style: LogStyle) -> Self {
        match style {
            LogStyle::Pretty => LogFormat::Pretty,
            LogStyle::Json => LogFormat::Json,
        }
    }
}

fn parse_override(raw: &str) -> Result<(Metric, MetricValue), String> {
    let (metric, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected METRIC=VALUE, got `{raw}`"))?;
    let metric: Metric = metric.parse().map_err(|e| format!("{e}"))?;
    let value: MetricValue = value.parse().map_err(|e| format!("{e}"))?;
    Ok((metric, value))
}

fn build_config(args: &Args) -> anyhow::Result<ScreenConfig> {
    let mut builder = ScreenConfig::builder()
        .with_env_api_key()
        .request_timeout(Duration::from_secs(args.timeout))
        .placeholder_mode(args.placeholders.into());

    if let Some(threshold) = args.de_threshold {
        builder = builder.debt_equity_threshold(threshold);
    }
    for &(metric, value) in &args.overrides {
        builder = builder.override_metric(metric, value);
    }

    Ok(builder.build()?)
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<RuleTable> {
    match path {
        Some(path) => RuleTable::from_path(path)
            .with_context(|| format!("Failed to load rule table from {}", path.display())),
        None => Ok(RuleTable::standard()),
    }
}

/// Screen one ticker and print the result; returns whether it succeeded
async fn screen_and_print(screener: &Screener, formatter: &dyn Formatter, ticker: &str) -> anyhow::Result<bool> {
    match screener.screen(ticker).await {
        Ok(screening) => {
            println!("{}", formatter.format_screening(&screening)?);
            Ok(true)
        }
        Err(e) => {
            tracing::debug!("Screening {} failed: {}", ticker, e);
            eprintln!("{}", formatter.format_error(&e.user_message()));
            Ok(false)
        }
    }
}

async fn run_interactive(screener: &Screener, formatter: &dyn Formatter) -> anyhow::Result<()> {
    println!("Enter a ticker symbol per line (`exit` to quit).");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("ticker> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        screen_and_print(screener, formatter, input).await?;
        println!();
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    screen_utils::init_tracing(args.log_format.into());

    info!("Starting stock-screen");

    let config = build_config(&args)?;
    let rules = Arc::new(load_rules(args.rules.as_deref())?);
    let formatter = FormatterFactory::create(args.format.into());

    if args.interactive {
        let yahoo = YahooFinanceClient::new(&config)?;
        let primary = Arc::new(CachedSource::new(yahoo, config.cache_ttl));
        let screener = Screener::with_primary(primary, &config, rules)?;
        run_interactive(&screener, formatter.as_ref()).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let screener = Screener::from_config(&config, rules)?;
    if screen_and_print(&screener, formatter.as_ref(), &args.ticker).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
