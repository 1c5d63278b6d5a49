//! The liquidation sweep: a periodic pass over all known accounts.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{debug, error, info};

use coreliq_chain::{Collateral, LiquidationCall, Simulation};

use crate::registry::AccountRegistry;

/// Headroom applied to the node's gas estimate (denominator of the extra
/// fifth, i.e. estimate * 6 / 5).
const GAS_HEADROOM_DIV: u64 = 5;

/// Attempts liquidations across the account registry.
///
/// Each account gets two independent attempts per sweep, one per collateral
/// type. Failures are isolated: no simulation or submission outcome for one
/// (account, collateral) pair affects any other. The sweep has no return
/// value; it is observable only through logs.
pub struct Liquidator {
    /// Pool liquidation entrypoints
    contract: Arc<dyn LiquidationCall>,
    /// Shared account registry
    registry: Arc<AccountRegistry>,
}

impl Liquidator {
    /// Create a new liquidator.
    pub fn new(contract: Arc<dyn LiquidationCall>, registry: Arc<AccountRegistry>) -> Self {
        Self { contract, registry }
    }

    /// Run one full sweep over a snapshot of the registry.
    pub async fn sweep(&self) {
        let accounts = self.registry.snapshot();
        info!(accounts = accounts.len(), "Looking for liquidations...");

        for account in accounts {
            for collateral in Collateral::ALL {
                self.try_liquidate(account, collateral).await;
            }
        }
    }

    /// Attempt one liquidation variant: simulate, and submit only if the
    /// simulation says the call would succeed.
    async fn try_liquidate(&self, account: Address, collateral: Collateral) {
        let gas = match self.contract.simulate(account, collateral).await {
            Ok(Simulation::Ready { gas }) => gas,
            // Expected negative result: the position is not liquidatable
            // for this collateral right now.
            Ok(Simulation::Reverted { .. }) => return,
            Err(e) => {
                debug!(
                    account = %account,
                    collateral = %collateral,
                    error = %e,
                    "Simulation failed before reaching the contract"
                );
                return;
            }
        };

        info!("Liquidating {} {} collateral...", account, collateral);

        let gas_limit = gas + gas / GAS_HEADROOM_DIV;
        match self.contract.liquidate(account, collateral, gas_limit).await {
            Ok(tx_hash) => {
                info!(tx_hash = %tx_hash, account = %account, "Liquidation submitted");
            }
            Err(e) => {
                error!(
                    account = %account,
                    collateral = %collateral,
                    error = %e,
                    "Liquidation submission failed"
                );
            }
        }
    }
}
