//! Chain access for the liquidation bot.
//!
//! This crate owns everything that touches the node:
//! - Provider management for the configured RPC endpoint
//! - `sol!` bindings for the lending pool contract
//! - Loan event ingestion (historical backfill + live stream)
//! - Transaction signing and submission

mod contracts;
mod event_listener;
mod provider;
mod sender;

pub use contracts::{
    loaned_signature, Collateral, ILendingPool, LendingPool, LiquidationCall, Simulation,
};
pub use event_listener::{EventListener, LoanEvent};
pub use provider::ProviderManager;
pub use sender::TransactionSender;
