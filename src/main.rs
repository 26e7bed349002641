//! DexVolume - swap-event USD price and volume aggregator
//!
//! Polls swap sources, folds every swap into the tick-bucketed aggregator
//! and periodically reports watched token prices.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dexvolume::config::AppConfig;
use dexvolume::driver::{JsonlSwapSource, PollingDriver, PriceReporter, RetryPolicy};
use dexvolume::persistence::CsvPersistence;
use dexvolume::pricing::{SharedPricing, TokenPricing, VolumeAccumulator};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(config.logging.json);

    info!("Starting DexVolume v{}", env!("CARGO_PKG_VERSION"));
    info!(config = %config, "Configuration loaded");

    let registry = config.token_registry()?;
    let assets = config.pricing_assets()?;
    info!(
        tokens = registry.len(),
        pricing_assets = assets.len(),
        "Token registry ready"
    );

    let pricing = TokenPricing::new(config.pricing.tick_width, registry, assets)
        .context("Failed to create pricing engine")?
        .with_max_history(config.history_limit());
    let pricing = SharedPricing::new(pricing);

    let persistence = if config.persistence.csv_enabled {
        Some(Arc::new(CsvPersistence::new(&config.persistence.data_dir)?))
    } else {
        None
    };

    let Some(replay_file) = config.driver.replay_file.clone() else {
        bail!("No swap source configured; set driver.replay_file (DEXVOLUME__DRIVER__REPLAY_FILE)");
    };

    let mut driver = PollingDriver::new(
        pricing.clone(),
        VolumeAccumulator::new(config.error_policy()),
        RetryPolicy::from_config(&config.driver),
        config.driver.poll_interval(),
        config.driver.start_block,
    )
    .with_source(Box::new(JsonlSwapSource::new(replay_file)));

    let mut reporter = PriceReporter::new(
        pricing,
        config.watch_tokens()?,
        Duration::from_secs(config.report.interval_secs),
    );

    if let Some(persistence) = persistence {
        driver = driver.with_persistence(persistence.clone());
        reporter = reporter.with_persistence(persistence);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut driver_handle = tokio::spawn(driver.run(shutdown_rx.clone()));
    let reporter_handle = tokio::spawn(reporter.run(shutdown_rx));

    // The driver stops on its own only when a batch fails to price
    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("SIGINT received, shutting down");
            None
        }
        result = &mut driver_handle => Some(result),
    };
    let _ = shutdown_tx.send(true);

    let driver_result = match finished {
        Some(result) => result,
        None => driver_handle.await,
    };
    for (name, result) in [("driver", driver_result), ("reporter", reporter_handle.await)] {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(task = name, error = %e, "Task stopped with error"),
            Err(e) => error!(task = name, error = %e, "Task panicked"),
        }
    }

    info!("DexVolume stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
