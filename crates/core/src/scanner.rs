//! Scanner orchestration for the liquidation bot.
//!
//! Coordinates ingestion and sweeping: seed the registry from recent
//! history, keep it growing from the live event stream, and run the
//! liquidation sweep on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use coreliq_chain::{EventListener, ProviderManager};

use crate::liquidator::Liquidator;
use crate::registry::AccountRegistry;

/// Main orchestrator tying the registry, the event stream and the sweep
/// together.
pub struct Scanner {
    /// Shared account registry
    registry: Arc<AccountRegistry>,
    /// Provider manager
    provider: Arc<ProviderManager>,
    /// Loan event listener
    listener: Arc<EventListener>,
    /// Liquidation executor
    liquidator: Arc<Liquidator>,
    /// Historical scan depth in blocks
    history_window: u64,
    /// Interval between sweeps
    poll_interval: Duration,
}

impl Scanner {
    /// Create a new scanner.
    pub fn new(
        registry: Arc<AccountRegistry>,
        provider: Arc<ProviderManager>,
        listener: Arc<EventListener>,
        liquidator: Arc<Liquidator>,
        history_window: u64,
        poll_interval: Duration,
    ) -> Self {
        Self {
            registry,
            provider,
            listener,
            liquidator,
            history_window,
            poll_interval,
        }
    }

    /// Seed the registry from the recent block window.
    pub async fn bootstrap(&self) -> Result<()> {
        info!("Fetching past events...");

        let to_block = self.provider.block_number().await?;
        // Saturating: a chain younger than the window scans from genesis.
        let from_block = to_block.saturating_sub(self.history_window);

        let events = self.listener.backfill(from_block, to_block).await?;
        for event in events {
            if self.registry.insert(event.account) {
                debug!(
                    account = %event.account,
                    block = event.block_number,
                    "Seeded account from history"
                );
            }
        }

        info!(
            "Found {} accounts with potential loans",
            self.registry.len()
        );
        Ok(())
    }

    /// Run the bot: install the live subscription, then sweep forever.
    ///
    /// The subscription is installed only after [`Scanner::bootstrap`] has
    /// completed, so no event falls between the historical scan and the
    /// live stream; an event seen by both is absorbed by the registry's
    /// set-insert. Sweeps are serialized: each tick waits for the previous
    /// sweep to finish before starting the next one.
    pub async fn run(&self) -> Result<()> {
        info!("Subscribing to Loan event...");
        let mut events = self.listener.subscribe().await?;

        let registry = self.registry.clone();
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                registry.insert(event.account);
                info!(
                    "New account {}, total account {}",
                    event.account,
                    registry.len()
                );
            }
            // The timer below keeps the process alive either way.
            warn!("Loan event stream ended; registry will no longer grow");
        });

        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "Starting liquidation sweeps"
        );
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            // First tick completes immediately: the first sweep runs at
            // startup, the rest on the configured interval.
            ticker.tick().await;
            self.liquidator.sweep().await;
        }
    }
}
