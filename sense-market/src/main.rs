//! `sense` - command-line front end for the screener and chart engines.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use sense_common::config::{config_path, Config, ConfigSource};
use sense_common::logging::init_logging_with_exclusions;
use sense_market::chart::RangeSelection;
use sense_market::controller::{ChartController, ChartResult, Commit, CommittedChart};
use sense_market::data::{FilterContext, HttpMarketService, MarketService};
use sense_market::screener::{Metric, MetricGroup, ScreenerSession, StockRecord};

#[derive(Parser, Debug)]
#[command(name = "sense")]
#[command(version)]
#[command(about = "Screen stocks and inspect price history from the terminal.", long_about = None)]
struct Cli {
    /// Override the service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List screenable metrics with their comparison direction
    Metrics,

    /// Fetch the screener table and filter it locally
    Screen {
        /// Only keep records listed on this exchange (e.g. NSE, BSE)
        #[arg(long)]
        exchange: Option<String>,

        /// Threshold as key=value, repeatable (e.g. --filter pe=25 --filter roe=15)
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(Metric, String)>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch and shape the price history of a symbol
    Chart {
        symbol: String,

        /// Range token (5d, 1w, 1m, 6m, 1y, 5y); defaults to the configured range
        #[arg(short, long)]
        range: Option<RangeSelection>,

        /// Print the committed chart as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the detail record of a symbol
    Detail { symbol: String },

    /// Print the effective configuration
    Config {
        /// Write it to the config file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

fn parse_filter(s: &str) -> Result<(Metric, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let metric = key.trim().parse::<Metric>().map_err(|e| e.to_string())?;
    Ok((metric, value.trim().to_string()))
}

/// Apply command-line overrides on top of file and env values, then validate.
fn apply_cli_overrides(mut config: Config, base_url: Option<String>) -> Result<Config> {
    if let Some(base_url) = base_url {
        config.service.base_url = base_url;
    }
    Ok(config.validated()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = Config::load()?;
    let ignored = config.apply_env_overrides();
    let config = apply_cli_overrides(config, cli.base_url)?;

    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    match &source {
        ConfigSource::File(path) => tracing::debug!(path = %path.display(), "Loaded config"),
        ConfigSource::Defaults(path) => {
            tracing::info!(path = %path.display(), "Config file not found, using defaults")
        }
    }
    for var in ignored {
        tracing::warn!(var, "Ignoring unparseable environment override");
    }

    tracing::debug!(base_url = %config.base_url(), "Sense v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Metrics => {
            print_metrics();
            Ok(())
        }
        Commands::Screen {
            exchange,
            filters,
            json,
        } => screen(&config, exchange, filters, json).await,
        Commands::Chart {
            symbol,
            range,
            json,
        } => chart(&config, &symbol, range, json).await,
        Commands::Detail { symbol } => detail(&config, &symbol).await,
        Commands::Config { init } => show_config(&config, init),
    }
}

fn print_metrics() {
    for group in MetricGroup::ALL {
        println!("{}", group.title());
        for metric in group.metrics() {
            let d = metric.descriptor();
            println!(
                "  {:<22} {} {:<28} {}",
                d.key,
                d.direction.symbol(),
                d.label,
                d.placeholder
            );
        }
    }
}

async fn screen(
    config: &Config,
    exchange: Option<String>,
    filters: Vec<(Metric, String)>,
    json: bool,
) -> Result<()> {
    let service = HttpMarketService::from_config(config)?;
    let context = match &exchange {
        Some(e) => FilterContext::exchange(e.clone()),
        None => FilterContext::all(),
    };

    let mut session = ScreenerSession::new();
    session
        .load(&service, &context)
        .await
        .context("Failed to fetch screener table")?;

    session.set_exchange(exchange);
    for (metric, value) in filters {
        session.set_threshold(metric, value);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(session.results())?);
        return Ok(());
    }

    let active = session.spec().active_filters();
    for record in session.results() {
        let values: Vec<String> = active
            .iter()
            .map(|f| {
                let shown = record
                    .metric(f.metric)
                    .map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
                format!("{}={}", f.metric.key(), shown)
            })
            .collect();
        println!(
            "{:<14} {:<32} {:<5} {}",
            record.symbol,
            record.name,
            record.exchange,
            values.join(" ")
        );
    }

    if let Some(stats) = session.stats() {
        println!(
            "\n{} of {} records match ({:.1}% eliminated)",
            stats.passed, stats.input, stats.elimination_rate
        );
    }
    Ok(())
}

async fn chart(
    config: &Config,
    symbol: &str,
    range: Option<RangeSelection>,
    json: bool,
) -> Result<()> {
    let service: Arc<dyn MarketService> = Arc::new(HttpMarketService::from_config(config)?);
    let controller = ChartController::from_config(service, &config.chart);

    if let Some(range) = range {
        // No symbol selected yet, so this only records the range
        controller.select_range(range).await;
    }
    if controller.select_symbol(symbol).await == Commit::Idle {
        bail!("No symbol given");
    }

    let snapshot = controller.snapshot().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let Some(committed) = &snapshot.committed else {
        println!("No data available for {} ({})", symbol, snapshot.range.label());
        return Ok(());
    };

    match &committed.result {
        ChartResult::Ready { series } => {
            println!("{}", chart_heading(committed));
            println!(
                "{} points, {} to {}",
                series.len(),
                series.labels().first().map_or("", String::as_str),
                series.labels().last().map_or("", String::as_str),
            );
            if let Some(price) = series.last_price() {
                println!("Last price: {:.2}", price);
            }
            for dataset in snapshot.datasets() {
                let valid = dataset.data.iter().filter(|p| p.is_some()).count();
                println!("  {:<20} {}/{} valid points", dataset.label, valid, dataset.data.len());
            }
            Ok(())
        }
        ChartResult::NoData => {
            println!("No data available for {}", chart_heading(committed));
            Ok(())
        }
        ChartResult::Failed { message } => bail!("Chart request failed: {}", message),
    }
}

/// `SYMBOL (Range, interval bars over period)` for the committed selection.
fn chart_heading(committed: &CommittedChart) -> String {
    let (interval, period) = committed.range.interval_and_period();
    format!(
        "{} ({}, {} bars over {})",
        committed.symbol,
        committed.range.label(),
        interval,
        period
    )
}

async fn detail(config: &Config, symbol: &str) -> Result<()> {
    let service = HttpMarketService::from_config(config)?;
    let record: StockRecord = sense_common::ResultExt::context(
        service.fetch_detail(symbol).await,
        format!("Fetching detail for {}", symbol),
    )?;

    let mut fields: Vec<(&String, &Value)> = record.fields.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    println!("{} {}", record.symbol, record.name);
    if !record.exchange.is_empty() || !record.sector.is_empty() {
        println!("{} | {}", record.exchange, record.sector);
    }
    for (key, value) in fields {
        let shown = match value {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        };
        println!("  {:<28} {}", key, shown);
    }
    Ok(())
}

fn show_config(config: &Config, init: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if init {
        let path = config_path();
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }
        // Env and --base-url overrides stay out of the written file
        Config::default().save()?;
        println!("Wrote defaults to {}", path.display());
    }
    Ok(())
}
