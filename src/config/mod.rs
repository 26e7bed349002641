//! Configuration management for DexVolume
//!
//! Loads from YAML/TOML files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use ethers::types::Address;
use serde::Deserialize;
use std::time::Duration;

use crate::error::parse_address;
use crate::pricing::ErrorPolicy;
use crate::tokens::{mainnet, PricingAssets, Token, TokenRegistry};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    /// Extra or overriding token metadata on top of the mainnet registry
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
    pub driver: DriverConfig,
    pub report: ReportConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Tick width in block-number units
    pub tick_width: u64,
    /// History points kept per token (0 = unbounded)
    pub max_history: usize,
    /// Anchor addresses in precedence order
    pub pricing_assets: Vec<String>,
    /// Anchors pinned to exactly 1 USD
    pub usd_stable_assets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
    pub address: String,
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// Polling interval in seconds
    pub poll_interval_secs: u64,
    /// Retries per source fetch after the first attempt
    pub max_retries: u32,
    /// Timeout of a single fetch attempt in milliseconds
    pub fetch_timeout_ms: u64,
    /// First backoff delay in milliseconds, doubled per attempt
    pub base_backoff_ms: u64,
    /// First block to ingest
    pub start_block: u64,
    /// Skip events that fail to price instead of failing the round
    pub skip_failed_events: bool,
    /// JSON-lines file of swap events to replay
    #[serde(default)]
    pub replay_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Report interval in seconds
    pub interval_secs: u64,
    /// Token addresses to report on
    pub watch_tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Data directory
    pub data_dir: String,
    /// Enable CSV report export
    pub csv_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human-readable format
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (DEXVOLUME__*)
            .add_source(Environment::with_prefix("DEXVOLUME").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Built-in defaults only, without files or environment
    pub fn from_defaults() -> Result<Self> {
        let config = Self::defaults()?
            .build()
            .context("Failed to build default configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize default configuration")
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            // Pricing defaults
            .set_default("pricing.tick_width", 20)?
            .set_default("pricing.max_history", 0)?
            .set_default("pricing.pricing_assets", mainnet::PRICING_ASSETS.to_vec())?
            .set_default(
                "pricing.usd_stable_assets",
                mainnet::USD_STABLE_ASSETS.to_vec(),
            )?
            // Driver defaults
            .set_default("driver.poll_interval_secs", 15)?
            .set_default("driver.max_retries", 3)?
            .set_default("driver.fetch_timeout_ms", 30_000)?
            .set_default("driver.base_backoff_ms", 500)?
            .set_default("driver.start_block", 0)?
            .set_default("driver.skip_failed_events", true)?
            // Report defaults
            .set_default("report.interval_secs", 30)?
            .set_default("report.watch_tokens", vec![mainnet::WETH, mainnet::WBTC])?
            // Persistence defaults
            .set_default("persistence.data_dir", "./data")?
            .set_default("persistence.csv_enabled", true)?
            // Logging defaults
            .set_default("logging.json", false)?;
        Ok(builder)
    }

    /// Check cross-field constraints that deserialization cannot express
    pub fn validate(&self) -> Result<()> {
        if self.pricing.tick_width == 0 {
            bail!("pricing.tick_width must be greater than zero");
        }
        if self.driver.poll_interval_secs == 0 || self.report.interval_secs == 0 {
            bail!("driver.poll_interval_secs and report.interval_secs must be greater than zero");
        }

        let registry = self.token_registry()?;
        let assets = self.pricing_assets()?;
        for anchor in assets.iter() {
            if !registry.contains(anchor) {
                bail!("pricing asset {:?} is missing from the token registry", anchor);
            }
        }
        for stable in &self.pricing.usd_stable_assets {
            if !self
                .pricing
                .pricing_assets
                .iter()
                .any(|a| a.eq_ignore_ascii_case(stable))
            {
                bail!("usd stable asset {} is not listed as a pricing asset", stable);
            }
        }
        self.watch_tokens()?;
        Ok(())
    }

    /// Mainnet registry extended by the configured `tokens` entries
    pub fn token_registry(&self) -> Result<TokenRegistry> {
        let mut registry = TokenRegistry::mainnet();
        for entry in &self.tokens {
            let address = parse_address(&entry.address)
                .with_context(|| format!("Invalid token address for {}", entry.symbol))?;
            registry.insert(Token::new(address, entry.symbol.clone(), entry.decimals));
        }
        Ok(registry)
    }

    pub fn pricing_assets(&self) -> Result<PricingAssets> {
        PricingAssets::from_hex(
            &self.pricing.pricing_assets,
            &self.pricing.usd_stable_assets,
        )
        .context("Invalid pricing asset list")
    }

    pub fn watch_tokens(&self) -> Result<Vec<Address>> {
        self.report
            .watch_tokens
            .iter()
            .map(|t| parse_address(t).with_context(|| format!("Invalid watch token {}", t)))
            .collect()
    }

    /// History bound handed to the aggregator
    pub fn history_limit(&self) -> Option<usize> {
        match self.pricing.max_history {
            0 => None,
            n => Some(n),
        }
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        if self.driver.skip_failed_events {
            ErrorPolicy::Skip
        } else {
            ErrorPolicy::Abort
        }
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "tick_width={} max_history={} anchors={} extra_tokens={} poll={}s report={}s replay={}",
            self.pricing.tick_width,
            self.pricing.max_history,
            self.pricing.pricing_assets.len(),
            self.tokens.len(),
            self.driver.poll_interval_secs,
            self.report.interval_secs,
            self.driver.replay_file.as_deref().unwrap_or("none")
        )
    }
}

impl DriverConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
