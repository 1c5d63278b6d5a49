//! CoreLiq Liquidation Bot
//!
//! Watches a lending pool for `Loaned` events, tracks borrower accounts,
//! and periodically attempts to liquidate undercollateralized positions
//! (CORE and CoreDAO collateral independently).

use std::fs;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coreliq_chain::{EventListener, LendingPool, ProviderManager, TransactionSender};
use coreliq_core::{AccountRegistry, Liquidator, Scanner, Settings, HISTORY_WINDOW_BLOCKS};

const LOG_DIR: &str = "log";
const LOG_FILE: &str = "log/app.log";

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    // Fail fast on configuration before touching the network
    let settings = Settings::from_env()?;
    info!("Using RPC {}", settings.rpc_url);
    info!("Contract Address {}", settings.contract_address);

    // Verify the node is reachable
    let provider = Arc::new(ProviderManager::connect(&settings.rpc_url).await?);

    let sender = Arc::new(TransactionSender::new(
        &settings.private_key,
        &settings.rpc_url,
    )?);
    info!(address = %sender.address, "Transaction sender initialized");

    let pool = Arc::new(LendingPool::new(settings.contract_address, sender));
    let listener = Arc::new(EventListener::new(
        &settings.rpc_url,
        settings.contract_address,
    ));
    let registry = Arc::new(AccountRegistry::new());
    let liquidator = Arc::new(Liquidator::new(pool, registry.clone()));

    let scanner = Scanner::new(
        registry,
        provider,
        listener,
        liquidator,
        HISTORY_WINDOW_BLOCKS,
        settings.polling_interval,
    );

    scanner.bootstrap().await?;
    scanner.run().await
}

/// Initialize tracing with a console layer and an append-only file layer.
fn init_tracing() -> Result<()> {
    fs::create_dir_all(LOG_DIR).with_context(|| format!("creating {LOG_DIR}/"))?;
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("opening {LOG_FILE}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,coreliq_core=debug,coreliq_chain=debug")),
        )
        .init();

    Ok(())
}

/// Print startup banner.
fn print_banner() {
    println!(
        r#"
    ╔═╗┌─┐┬─┐┌─┐╦  ┬┌─┐
    ║  │ │├┬┘├┤ ║  ││─┼┐
    ╚═╝└─┘┴└─└─┘╩═╝┴└─┘└
    Liquidation Bot v0.1.0
    "#
    );
}
