//! tron-balances — TRX + USDT balance sweeper.
//!
//! Entry point. Loads configuration, initialises structured logging, reads
//! the address and proxy files, resolves every address with bounded
//! concurrency, and writes the balance report.

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use tron_balances::config;
use tron_balances::engine::aggregator;
use tron_balances::engine::dispatcher::Dispatcher;
use tron_balances::engine::retry::{RetryCoordinator, RetryPolicy};
use tron_balances::explorer::resolver::ExplorerResolver;
use tron_balances::http::ReqwestTransportFactory;
use tron_balances::storage;
use tron_balances::types::format_amount;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("TRON_BALANCES_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::AppConfig::load_or_default(&config_path)?;

    init_logging();

    let target = cfg.token_target();
    info!(
        config = %config_path,
        token = %target.symbol,
        contract = %target.contract,
        max_concurrency = cfg.run.max_concurrency,
        max_attempts = cfg.run.max_attempts,
        "tron-balances starting up"
    );

    // -- Inputs ----------------------------------------------------------

    let proxies = storage::load_proxies(&cfg.files.proxies)?;

    let addresses = match storage::load_addresses(&cfg.files.addresses) {
        Ok(a) if !a.is_empty() => a,
        Ok(_) => {
            error!(path = %cfg.files.addresses, "No addresses to check");
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "Could not load addresses");
            return Ok(());
        }
    };

    // -- Components ------------------------------------------------------

    let resolver = ExplorerResolver::new(cfg.endpoints(), target);
    let coordinator = RetryCoordinator::new(
        Arc::new(resolver),
        Arc::new(ReqwestTransportFactory::new(cfg.http_settings())),
        Arc::new(proxies),
        RetryPolicy {
            max_attempts: cfg.run.max_attempts,
            backoff: cfg.retry_backoff(),
        },
    );
    let dispatcher = Dispatcher::new(coordinator, cfg.run.max_concurrency);

    // -- Run -------------------------------------------------------------

    let started = Instant::now();
    let results = dispatcher.run_all(&addresses).await;
    let elapsed = started.elapsed();

    let report = aggregator::summarize_with(&results, cfg.run.strict_unresolved);
    storage::save_report(&report, &cfg.files.output)?;

    info!(
        output = %cfg.files.output,
        total_trx = %format_amount(report.total_native),
        total_usdt = %format_amount(report.total_token),
        processed = report.processed,
        unresolved = report.unresolved,
        elapsed_secs = format!("{:.2}", elapsed.as_secs_f64()),
        "Sweep complete"
    );
    info!(
        trx_funded = report.funded_native,
        usdt_funded = report.funded_token,
        "Funded addresses"
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tron_balances=info"));

    let json_logging = std::env::var("TRON_BALANCES_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
