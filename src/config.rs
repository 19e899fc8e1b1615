use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub account: AccountConfig,
    pub data: DataConfig,
    pub engine: EngineConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    /// Risk mode selecting the strategy parameter preset
    #[serde(default)]
    pub risk_mode: RiskMode,
    /// Full strategy parameter override; when absent the preset for
    /// `risk_mode` applies
    #[serde(default)]
    pub strategy: Option<StrategyParams>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Simulated starting cash balance in USD
    pub start_balance: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// REST endpoint for public market data
    pub rest_url: String,
    /// Candle bucket size in seconds (e.g. 300 = 5-minute candles)
    pub granularity_secs: u32,
    /// How many candles to fetch for indicator computation
    pub lookback_candles: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Seconds to sleep between cycles
    pub poll_interval_secs: u64,
    /// Seconds to back off after an unexpected cycle error
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
    /// How many random markets to scan each cycle
    pub markets_per_scan: usize,
    /// Universe of markets to sample from
    pub universe: Vec<String>,
}

fn default_error_backoff() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct JournalConfig {
    /// Path of the JSON-lines trade journal; `None` disables journaling
    #[serde(default)]
    pub path: Option<String>,
}

/// Risk mode: conservative or aggressive parameter preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RiskMode {
    #[default]
    Conservative,
    Aggressive,
}

impl fmt::Display for RiskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskMode::Conservative => write!(f, "conservative"),
            RiskMode::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// One parameterized strategy; the presets differ only in these constants.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyParams {
    /// Unrealized gain that forces a take-profit exit (e.g. 0.01 = +1%)
    pub take_profit_pct: Decimal,
    /// Unrealized loss magnitude that forces a stop-loss exit, stored
    /// positive and compared as `change_pct <= -stop_loss_pct`
    pub stop_loss_pct: Decimal,
    /// Fraction of current cash spent per new position
    pub position_size_fraction: Decimal,
    /// Cap on concurrently open positions
    pub max_open_positions: usize,
    /// Entries below this USD spend are refused
    pub min_trade_usd: Decimal,
    /// Short-over-long moving-average gap required to consider a market
    pub min_trend_strength: Decimal,
    /// RSI acceptance band
    pub rsi_buy_min: Decimal,
    pub rsi_buy_max: Decimal,
    /// Volatility (mean absolute move per candle) acceptance band
    pub min_volatility: Decimal,
    pub max_volatility: Decimal,
    /// Trailing candles used for the volatility proxy (valid range 20-40)
    pub volatility_window: usize,
    /// Intraday drawdown that pauses new entries for the rest of the day
    pub max_daily_drawdown: Decimal,
    /// Consecutive losing exits that pause new entries
    pub max_losing_streak: u32,
}

impl StrategyParams {
    pub fn conservative() -> Self {
        Self {
            take_profit_pct: dec!(0.010),
            stop_loss_pct: dec!(0.015),
            position_size_fraction: dec!(0.3),
            max_open_positions: 1,
            min_trade_usd: dec!(5),
            min_trend_strength: dec!(0.002),
            rsi_buy_min: dec!(40),
            rsi_buy_max: dec!(65),
            min_volatility: dec!(0.002),
            max_volatility: dec!(0.03),
            volatility_window: 30,
            max_daily_drawdown: dec!(0.05),
            max_losing_streak: 3,
        }
    }

    pub fn aggressive() -> Self {
        Self {
            take_profit_pct: dec!(0.020),
            stop_loss_pct: dec!(0.03),
            position_size_fraction: dec!(0.5),
            max_open_positions: 3,
            min_trend_strength: dec!(0.0015),
            rsi_buy_min: dec!(35),
            rsi_buy_max: dec!(70),
            max_daily_drawdown: dec!(0.08),
            ..Self::conservative()
        }
    }

    pub fn for_mode(mode: RiskMode) -> Self {
        match mode {
            RiskMode::Conservative => Self::conservative(),
            RiskMode::Aggressive => Self::aggressive(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values so env-only runs work
            .set_default("account.start_balance", "100")?
            .set_default("data.rest_url", "https://api.exchange.coinbase.com")?
            .set_default("data.granularity_secs", 300)?
            .set_default("data.lookback_candles", 100)?
            .set_default("data.request_timeout_secs", 10)?
            .set_default("engine.poll_interval_secs", 360)?
            .set_default("engine.error_backoff_secs", 10)?
            .set_default("engine.markets_per_scan", 8)?
            .set_default("engine.universe", default_universe())?
            .set_default("journal.path", "gambit_trades.jsonl")?
            .set_default("risk_mode", "conservative")?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g. config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("GAMBIT_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (GAMBIT_ACCOUNT__START_BALANCE, etc.)
            .add_source(
                Environment::with_prefix("GAMBIT")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// The effective strategy parameters: explicit override or mode preset.
    pub fn params(&self) -> StrategyParams {
        self.strategy
            .clone()
            .unwrap_or_else(|| StrategyParams::for_mode(self.risk_mode))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let params = self.params();

        if self.account.start_balance <= Decimal::ZERO {
            errors.push("account.start_balance must be positive".to_string());
        }

        if self.data.granularity_secs == 0 {
            errors.push("data.granularity_secs must be positive".to_string());
        }
        if self.data.lookback_candles < crate::domain::MIN_SCORING_LEN {
            errors.push(format!(
                "data.lookback_candles must be at least {}",
                crate::domain::MIN_SCORING_LEN
            ));
        }

        if self.engine.universe.is_empty() {
            errors.push("engine.universe must not be empty".to_string());
        }
        if self.engine.markets_per_scan == 0 {
            errors.push("engine.markets_per_scan must be positive".to_string());
        }

        if params.take_profit_pct <= Decimal::ZERO {
            errors.push("take_profit_pct must be positive".to_string());
        }
        if params.stop_loss_pct <= Decimal::ZERO {
            errors.push("stop_loss_pct must be a positive magnitude".to_string());
        }
        if params.position_size_fraction <= Decimal::ZERO
            || params.position_size_fraction > Decimal::ONE
        {
            errors.push("position_size_fraction must be in (0, 1]".to_string());
        }
        if params.max_open_positions == 0 {
            errors.push("max_open_positions must be at least 1".to_string());
        }
        // A positive trend floor keeps every accepted score positive.
        if params.min_trend_strength <= Decimal::ZERO {
            errors.push("min_trend_strength must be positive".to_string());
        }
        if params.rsi_buy_min >= params.rsi_buy_max
            || params.rsi_buy_min < Decimal::ZERO
            || params.rsi_buy_max > Decimal::from(100)
        {
            errors.push("RSI band must satisfy 0 <= rsi_buy_min < rsi_buy_max <= 100".to_string());
        }
        if params.min_volatility <= Decimal::ZERO || params.min_volatility >= params.max_volatility
        {
            errors.push("volatility band must satisfy 0 < min_volatility < max_volatility".to_string());
        }
        if !(20..=40).contains(&params.volatility_window) {
            errors.push("volatility_window must be within 20..=40".to_string());
        }
        if params.max_daily_drawdown <= Decimal::ZERO || params.max_daily_drawdown >= Decimal::ONE
        {
            errors.push("max_daily_drawdown must be in (0, 1)".to_string());
        }
        if params.max_losing_streak == 0 {
            errors.push("max_losing_streak must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn default_universe() -> Vec<String> {
    [
        "BTC-USD", "ETH-USD", "SOL-USD", "AVAX-USD", "ADA-USD", "LTC-USD", "DOGE-USD", "LINK-USD",
        "MATIC-USD", "OP-USD", "ARB-USD", "ATOM-USD", "SAND-USD", "UNI-USD", "RNDR-USD",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
