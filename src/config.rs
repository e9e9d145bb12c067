// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use dotenv::dotenv;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_INSTRUMENTS: [&str; 10] = [
    "BTC", "ETH", "XRP", "BNB", "SOL", "ADA", "DOT", "LINK", "LTC", "AVAX",
];

/// Trader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Exchange API credentials
    pub exchange: ExchangeConfig,

    /// Decision service settings
    pub decision: DecisionConfig,

    /// Cycle and sizing configuration
    pub trading: TradingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Audit trail configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Exchange API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// API key
    pub api_key: String,

    /// API secret
    pub secret_key: String,

    /// API passphrase
    pub passphrase: String,

    /// Demo trading
    pub simulated: bool,

    /// REST base url
    pub base_url: String,

    /// Appended to a coin to form the instrument id, e.g. `-USD-SWAP`
    pub instrument_suffix: String,
}

impl ExchangeConfig {
    pub fn instrument_id(&self, coin: &str) -> String {
        format!("{}{}", coin, self.instrument_suffix)
    }
}

/// Decision service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Bearer token
    pub api_key: String,

    /// Chat completions endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Upper bound on one consultation
    pub timeout_secs: u64,

    pub temperature: f64,

    pub max_tokens: u32,
}

impl DecisionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Trading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Coins traded, e.g. ["BTC", "ETH"]
    pub instruments: Vec<String>,

    /// Seconds between cycles
    pub interval_secs: u64,

    /// Position sizes at or below this are treated as no trade
    pub min_position_size: Decimal,

    /// Equity used when the startup balance query fails
    pub fallback_equity: Decimal,

    /// Re-read equity before each execution phase
    pub refresh_equity: bool,

    /// Candles per timeframe
    pub candle_limit: usize,

    pub order_book_depth: usize,

    pub trade_limit: usize,

    /// Pause between instruments while snapshotting
    pub fetch_pause_ms: u64,

    /// Sleep after a skipped cycle
    pub snapshot_cooldown_secs: u64,

    /// Cap on the sleep after an aborted cycle
    pub error_cooldown_secs: u64,
}

impl TradingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_pause(&self) -> Duration {
        Duration::from_millis(self.fetch_pause_ms)
    }

    /// Always shorter than the normal interval
    pub fn snapshot_cooldown(&self) -> Duration {
        let secs = self
            .snapshot_cooldown_secs
            .min(self.interval_secs.saturating_sub(1))
            .max(1);
        Duration::from_secs(secs)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs(self.error_cooldown_secs.min(self.interval_secs))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// JSON-lines file receiving one cycle record per line
    pub file_path: Option<String>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn required(key: &str) -> AppResult<String> {
    env::var(key).map_err(|_| AppError::Config(format!("Missing {} environment variable", key)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let exchange_config = ExchangeConfig {
            api_key: required("OKX_API_KEY")?,
            secret_key: required("OKX_SECRET_KEY")?,
            passphrase: required("OKX_PASSPHRASE")?,
            simulated: env_or("OKX_SIMULATED", defaults.exchange.simulated),
            base_url: env::var("OKX_BASE_URL").unwrap_or(defaults.exchange.base_url),
            instrument_suffix: env::var("INSTRUMENT_SUFFIX")
                .unwrap_or(defaults.exchange.instrument_suffix),
        };

        let decision_config = DecisionConfig {
            api_key: required("DEEPSEEK_API_KEY")?,
            endpoint: env::var("DEEPSEEK_ENDPOINT").unwrap_or(defaults.decision.endpoint),
            model: env::var("DEEPSEEK_MODEL").unwrap_or(defaults.decision.model),
            timeout_secs: env_or("DECISION_TIMEOUT_SECS", defaults.decision.timeout_secs),
            ..defaults.decision
        };

        let instruments = match env::var("TRADING_INSTRUMENTS") {
            Ok(list) => list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => defaults.trading.instruments.clone(),
        };

        let trading_config = TradingConfig {
            instruments,
            interval_secs: env_or("DECISION_INTERVAL_SECS", defaults.trading.interval_secs),
            min_position_size: env_or("MIN_POSITION_SIZE", defaults.trading.min_position_size),
            fallback_equity: env_or("FALLBACK_EQUITY", defaults.trading.fallback_equity),
            refresh_equity: env_or("REFRESH_EQUITY", defaults.trading.refresh_equity),
            ..defaults.trading
        };

        let logging_config = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            to_file: env_or("LOG_TO_FILE", false),
            file_path: env::var("LOG_FILE_PATH").ok(),
        };

        let config = Config {
            exchange: exchange_config,
            decision: decision_config,
            trading: trading_config,
            logging: logging_config,
            audit: AuditConfig {
                file_path: env::var("AUDIT_LOG_PATH").ok(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path).map_err(|e| {
            AppError::Config(format!("Failed to open config file: {}", e))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::Config(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, contents).map_err(|e| {
            AppError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.trading.instruments.is_empty() {
            return Err(AppError::Config("No trading instruments configured".to_string()));
        }
        if self.trading.interval_secs == 0 {
            return Err(AppError::Config("Decision interval must be positive".to_string()));
        }
        let threshold = self.trading.min_position_size;
        if threshold < Decimal::ZERO || threshold >= Decimal::ONE {
            return Err(AppError::Config(format!(
                "Minimum position size {} must be in [0, 1)",
                threshold
            )));
        }
        if self.trading.fallback_equity < Decimal::ZERO {
            return Err(AppError::Config("Fallback equity cannot be negative".to_string()));
        }
        if self.decision.timeout_secs == 0 {
            return Err(AppError::Config("Decision timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        // Set log level
        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);
        // hyper is chatty at debug
        builder.filter_module("hyper", log::LevelFilter::Warn);

        // Configure output
        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path).map_err(|e| {
                    AppError::Config(format!("Failed to create log file: {}", e))
                })?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        builder.init();

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exchange: ExchangeConfig {
                api_key: "".to_string(),
                secret_key: "".to_string(),
                passphrase: "".to_string(),
                simulated: true,
                base_url: "https://www.okx.com".to_string(),
                instrument_suffix: "-USD-SWAP".to_string(),
            },
            decision: DecisionConfig {
                api_key: "".to_string(),
                endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
                model: "deepseek-chat".to_string(),
                timeout_secs: 120,
                temperature: 0.3,
                max_tokens: 4000,
            },
            trading: TradingConfig {
                instruments: DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
                interval_secs: 1800,
                min_position_size: Decimal::new(1, 3),
                fallback_equity: Decimal::new(1000, 0),
                refresh_equity: true,
                candle_limit: 100,
                order_book_depth: 25,
                trade_limit: 50,
                fetch_pause_ms: 100,
                snapshot_cooldown_secs: 60,
                error_cooldown_secs: 300,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                to_file: false,
                file_path: None,
            },
            audit: AuditConfig::default(),
        }
    }
}
