use std::path::{Path, PathBuf};

use analytics::{
    AnalyticsEngine, CalendarHeatmap, DayIntensity, EnhancedTradeStats, EquityPoint,
    IntensityLevel, equity_curve, max_drawdown,
};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use configuration::{Config, LogFormat, LoggingSettings};
use core_types::{Trade, TradeLog};
use rust_decimal::Decimal;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// The main entry point for the Tradelens dashboard tool.
fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _guard = init_tracing(&config.logging)?;

    let engine = AnalyticsEngine::new(&config)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Summary(args) => handle_summary(&engine, args),
        Commands::Calendar(args) => handle_calendar(&engine, &config, args),
        Commands::Equity(args) => handle_equity(args),
        Commands::Snapshot(args) => handle_snapshot(&engine, args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Trading performance analytics for a log of settled trades.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./tradelens.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the headline statistics.
    Summary(SummaryArgs),
    /// Print the daily-intensity calendar.
    Calendar(CalendarArgs),
    /// Print the equity curve and its maximum drawdown.
    Equity(TradesArgs),
    /// Print every dashboard figure as JSON.
    Snapshot(CalendarArgs),
}

#[derive(Args)]
struct TradesArgs {
    /// JSON file holding an array of trades.
    #[arg(long)]
    trades: PathBuf,
}

#[derive(Args)]
struct SummaryArgs {
    #[command(flatten)]
    input: TradesArgs,

    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CalendarArgs {
    #[command(flatten)]
    input: TradesArgs,

    /// A day in the last week shown (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    anchor: Option<NaiveDate>,
}

// ==============================================================================
// Setup
// ==============================================================================

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(settings: &LoggingSettings) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .context("Invalid log level")?;

    let console = match settings.format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    let (file, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "tradelens.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    Ok(guard)
}

/// Reads a JSON array of trades and validates every record.
fn load_trades(path: &Path) -> anyhow::Result<TradeLog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trades from {}", path.display()))?;
    let trades = parse_trades(&raw).with_context(|| format!("Invalid trade file {}", path.display()))?;

    let open = trades.iter().filter(|t| !t.is_closed()).count();
    tracing::info!(trades = trades.len(), open, path = %path.display(), "Loaded trade log.");
    Ok(TradeLog::from(trades))
}

fn parse_trades(raw: &str) -> anyhow::Result<Vec<Trade>> {
    let trades: Vec<Trade> = serde_json::from_str(raw)?;
    for (index, trade) in trades.iter().enumerate() {
        trade
            .validate()
            .with_context(|| format!("Trade at index {} failed validation", index))?;
    }
    Ok(trades)
}

fn default_anchor(engine: &AnalyticsEngine) -> NaiveDate {
    Utc::now()
        .with_timezone(&engine.calendar_window().offset())
        .date_naive()
}

// ==============================================================================
// Command Handlers
// ==============================================================================

fn handle_summary(engine: &AnalyticsEngine, args: SummaryArgs) -> anyhow::Result<()> {
    let log = load_trades(&args.input.trades)?;
    let stats = engine.compute_stats(log.trades());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", stats_table(&stats));
    }
    Ok(())
}

fn handle_calendar(
    engine: &AnalyticsEngine,
    config: &Config,
    args: CalendarArgs,
) -> anyhow::Result<()> {
    let log = load_trades(&args.input.trades)?;
    let anchor = args.anchor.unwrap_or_else(|| default_anchor(engine));
    let heatmap = engine.calendar(log.trades(), anchor);

    println!(
        "{} to {} (UTC{:+} min)",
        heatmap.start, heatmap.end, config.calendar.utc_offset_minutes
    );
    println!("{}", calendar_table(&heatmap));
    println!(
        "Net: {:.2} over {} trading days",
        heatmap.net_pnl(),
        heatmap.trading_days()
    );
    Ok(())
}

fn handle_equity(args: TradesArgs) -> anyhow::Result<()> {
    let log = load_trades(&args.trades)?;
    let curve = equity_curve(log.trades());

    println!("{}", equity_table(&curve));
    println!("Max drawdown: {:.2}", max_drawdown(&curve));
    Ok(())
}

fn handle_snapshot(engine: &AnalyticsEngine, args: CalendarArgs) -> anyhow::Result<()> {
    let log = load_trades(&args.input.trades)?;
    let anchor = args.anchor.unwrap_or_else(|| default_anchor(engine));
    let snapshot = engine.snapshot(log.trades(), anchor);

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

// ==============================================================================
// Rendering
// ==============================================================================

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn stats_table(stats: &EnhancedTradeStats) -> Table {
    let profit_factor = if stats.has_unbounded_profit_factor() {
        "unbounded".to_string()
    } else {
        format!("{:.2}", stats.profit_factor)
    };

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    let rows = [
        ("Total trades", stats.total_trades.to_string()),
        (
            "Wins / Losses / Breakeven",
            format!(
                "{} / {} / {}",
                stats.winning_trades, stats.losing_trades, stats.breakeven_trades
            ),
        ),
        ("Long / Short", format!("{} / {}", stats.long_trades, stats.short_trades)),
        ("Win rate", format!("{:.2}%", stats.win_rate)),
        ("Profit factor", profit_factor),
        ("Expectancy", money(stats.expectancy)),
        ("Total PnL", money(stats.total_pnl)),
        ("Average win", money(stats.avg_win)),
        ("Average loss", money(stats.avg_loss)),
        ("Average payout", money(stats.avg_payout)),
        ("Best trade", money(stats.best_trade)),
        ("Worst trade", money(stats.worst_trade)),
        ("Average R:R", format!("{:.2}", stats.avg_risk_reward)),
        (
            "Max consecutive wins / losses",
            format!(
                "{} / {}",
                stats.max_consecutive_wins, stats.max_consecutive_losses
            ),
        ),
        (
            "Average holding period",
            format!("{}s", stats.average_holding_period.as_secs()),
        ),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    table
}

fn intensity_marker(intensity: DayIntensity) -> &'static str {
    match intensity {
        DayIntensity::Empty => ".",
        DayIntensity::Flat => "=",
        DayIntensity::Profit(IntensityLevel::Low) => "+",
        DayIntensity::Profit(IntensityLevel::Medium) => "++",
        DayIntensity::Profit(IntensityLevel::High) => "+++",
        DayIntensity::Loss(IntensityLevel::Low) => "-",
        DayIntensity::Loss(IntensityLevel::Medium) => "--",
        DayIntensity::Loss(IntensityLevel::High) => "---",
    }
}

fn calendar_table(heatmap: &CalendarHeatmap) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
    for week in heatmap.weeks() {
        table.add_row(week.iter().map(|day| {
            if day.count == 0 {
                format!("{} {}", day.date.format("%d"), intensity_marker(day.intensity))
            } else {
                format!(
                    "{} {}\n{:.2} ({})",
                    day.date.format("%d"),
                    intensity_marker(day.intensity),
                    day.net_pnl,
                    day.count
                )
            }
        }));
    }
    table
}

fn equity_table(curve: &[EquityPoint]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Closed at", "Cumulative PnL"]);
    for point in curve {
        let when = point
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "start".to_string());
        table.add_row(vec![when, money(point.cumulative_pnl)]);
    }
    table
}
