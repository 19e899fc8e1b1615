use clap::{Parser, Subcommand};
use gambit::collector::{CoinbaseClient, MarketData};
use gambit::config::{AppConfig, RiskMode};
use gambit::domain::MarketId;
use gambit::error::{GambitError, Result};
use gambit::strategy::{Engine, MarketScorer, RandomSampler};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gambit", version, about = "Paper-trading strategy engine for spot crypto markets")]
struct Cli {
    /// Directory holding default.toml and environment overrides
    #[arg(long, default_value = "config")]
    config_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading loop until interrupted
    Run {
        /// Risk mode preset, overriding the configured one
        #[arg(long, value_enum)]
        mode: Option<RiskMode>,
        /// Starting cash balance in USD, overriding the configured one
        #[arg(long)]
        balance: Option<Decimal>,
    },
    /// Score the whole configured universe once and print the results
    Scan {
        /// Risk mode preset, overriding the configured one
        #[arg(long, value_enum)]
        mode: Option<RiskMode>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = AppConfig::load_from(&cli.config_dir)?;

    match cli.command {
        Commands::Run { mode, balance } => {
            if let Some(mode) = mode {
                config.risk_mode = mode;
            }
            if let Some(balance) = balance {
                config.account.start_balance = balance;
            }
            if let Err(errors) = config.validate() {
                for e in &errors {
                    error!("Invalid configuration: {}", e);
                }
                return Err(GambitError::Internal(
                    "configuration validation failed".to_string(),
                ));
            }
            run_engine(config).await
        }
        Commands::Scan { mode } => {
            if let Some(mode) = mode {
                config.risk_mode = mode;
            }
            scan_universe(&config).await
        }
    }
}

async fn run_engine(config: AppConfig) -> Result<()> {
    info!(
        "Starting gambit in {} mode with {:.2} USD paper balance",
        config.risk_mode, config.account.start_balance
    );

    let client = CoinbaseClient::new(
        &config.data.rest_url,
        Duration::from_secs(config.data.request_timeout_secs),
    )?;
    let mut engine = Engine::new(&config, client, RandomSampler);

    tokio::select! {
        _ = engine.run() => {}
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, exiting");
        }
    }

    Ok(())
}

/// One-shot diagnostic: fetch and score every market in the universe.
async fn scan_universe(config: &AppConfig) -> Result<()> {
    let client = CoinbaseClient::new(
        &config.data.rest_url,
        Duration::from_secs(config.data.request_timeout_secs),
    )?;
    let scorer = MarketScorer::new(config.params());

    println!(
        "Scanning {} markets ({} mode filters)",
        config.engine.universe.len(),
        config.risk_mode
    );

    for name in &config.engine.universe {
        let market = MarketId::from(name.as_str());
        match client
            .fetch_series(
                &market,
                config.data.lookback_candles,
                config.data.granularity_secs,
            )
            .await
        {
            Ok(series) => {
                let last = series
                    .last()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<12} last={:<14} {}", name, last, scorer.score(&series));
            }
            Err(e) => println!("  {:<12} unavailable: {}", name, e),
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gambit=debug"));

    // Optional file logging when GAMBIT_LOG_DIR is set. The daily appender
    // panics if it cannot create its first file, so preflight writability.
    let file_layer = std::env::var("GAMBIT_LOG_DIR").ok().and_then(|log_dir| {
        if std::fs::create_dir_all(&log_dir).is_err() {
            eprintln!(
                "Warning: could not create log directory {}, file logging disabled",
                log_dir
            );
            return None;
        }
        let test_path = std::path::Path::new(&log_dir).join(".gambit_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(&log_dir, "gambit.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                // Keep the guard alive for the lifetime of the process.
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: could not write to log directory {} ({}), file logging disabled",
                    log_dir, e
                );
                None
            }
        }
    });

    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}
