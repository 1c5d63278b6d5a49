//! Contract bindings for the lending pool.
//!
//! The pool exposes a single liquidation entrypoint, `liquidate(account,
//! isCore)`, where the flag selects which of the two collateral types backing
//! the loan is seized. Loan originations are announced through the `Loaned`
//! event; the borrower is the first indexed argument.

use std::sync::Arc;

use alloy::contract::Error as ContractError;
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::ProviderBuilder;
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};
use alloy::transports::RpcError;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::sender::TransactionSender;

sol! {
    /// Lending pool interface (subset used by the bot).
    #[sol(rpc)]
    interface ILendingPool {
        /// Emitted when a new loan is originated.
        event Loaned(
            address indexed account,
            address indexed lender,
            uint256 principal,
            uint256 collateral,
            bool isCore
        );

        /// Seize collateral from an undercollateralized account.
        function liquidate(address account, bool isCore) external;
    }
}

/// keccak256("Loaned(address,address,uint256,uint256,bool)")
pub fn loaned_signature() -> B256 {
    ILendingPool::Loaned::SIGNATURE_HASH
}

/// Collateral type backing a loan, encoded on-chain as the `isCore` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Collateral {
    /// Native CORE collateral (`isCore = true`)
    Core,
    /// CoreDAO collateral (`isCore = false`)
    CoreDao,
}

impl Collateral {
    /// Both collateral types, in the order the sweep attempts them.
    pub const ALL: [Collateral; 2] = [Collateral::Core, Collateral::CoreDao];

    /// The on-chain `isCore` flag value.
    pub fn flag(self) -> bool {
        matches!(self, Collateral::Core)
    }

    /// Decode the on-chain `isCore` flag.
    pub fn from_flag(is_core: bool) -> Self {
        if is_core {
            Collateral::Core
        } else {
            Collateral::CoreDao
        }
    }
}

impl std::fmt::Display for Collateral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collateral::Core => write!(f, "CORE"),
            Collateral::CoreDao => write!(f, "CoreDAO"),
        }
    }
}

/// Outcome of a liquidation dry run.
///
/// A node that answers `eth_estimateGas` with an execution revert is telling
/// us the position is not currently liquidatable; that is a negative result,
/// not an error. Transport-level failures (connection refused, timeouts)
/// surface as `Err` from [`LiquidationCall::simulate`] so callers can tell
/// the two apart.
#[derive(Debug, Clone)]
pub enum Simulation {
    /// The call would succeed; `gas` is the node's estimate.
    Ready { gas: u64 },
    /// The call would revert.
    Reverted { reason: String },
}

/// Liquidation entrypoints of the pool contract.
///
/// The sweep depends on this trait rather than on [`LendingPool`] directly,
/// which keeps the two-phase attempt testable without a node.
#[async_trait]
pub trait LiquidationCall: Send + Sync {
    /// Dry-run `liquidate(account, flag)` via gas estimation.
    async fn simulate(&self, account: Address, collateral: Collateral) -> Result<Simulation>;

    /// Submit the real `liquidate(account, flag)` transaction.
    ///
    /// Resolves once the transaction is broadcast; inclusion is not awaited.
    async fn liquidate(
        &self,
        account: Address,
        collateral: Collateral,
        gas_limit: u64,
    ) -> Result<B256>;
}

/// Lending pool contract wrapper bound to a transaction sender.
pub struct LendingPool {
    /// Contract address
    pub address: Address,
    /// Transaction sender (signing wallet + RPC endpoint)
    sender: Arc<TransactionSender>,
}

impl LendingPool {
    /// Create a new pool wrapper.
    pub fn new(address: Address, sender: Arc<TransactionSender>) -> Self {
        Self { address, sender }
    }

    /// Encode `liquidate(account, flag)` calldata.
    pub fn encode_liquidate(&self, account: Address, collateral: Collateral) -> Bytes {
        ILendingPool::liquidateCall {
            account,
            isCore: collateral.flag(),
        }
        .abi_encode()
        .into()
    }
}

#[async_trait]
impl LiquidationCall for LendingPool {
    async fn simulate(&self, account: Address, collateral: Collateral) -> Result<Simulation> {
        let provider = ProviderBuilder::new()
            .on_builtin(self.sender.rpc_url())
            .await?;
        let pool = ILendingPool::new(self.address, &provider);

        // Estimate from the signer address: the pool may gate `liquidate`
        // on the caller, and the real transaction will come from it.
        let call = pool
            .liquidate(account, collateral.flag())
            .from(self.sender.address);

        match call.estimate_gas().await {
            Ok(gas) => Ok(Simulation::Ready { gas }),
            Err(ContractError::TransportError(RpcError::ErrorResp(resp))) => {
                debug!(
                    account = %account,
                    collateral = %collateral,
                    code = resp.code,
                    "Liquidation estimate reverted"
                );
                Ok(Simulation::Reverted {
                    reason: resp.message.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn liquidate(
        &self,
        account: Address,
        collateral: Collateral,
        gas_limit: u64,
    ) -> Result<B256> {
        let calldata = self.encode_liquidate(account, collateral);
        self.sender.send(self.address, calldata, gas_limit).await
    }
}

impl std::fmt::Debug for LendingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LendingPool")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collateral_flag_round_trip() {
        assert!(Collateral::Core.flag());
        assert!(!Collateral::CoreDao.flag());
        assert_eq!(Collateral::from_flag(true), Collateral::Core);
        assert_eq!(Collateral::from_flag(false), Collateral::CoreDao);
    }

    #[test]
    fn test_collateral_display() {
        assert_eq!(Collateral::Core.to_string(), "CORE");
        assert_eq!(Collateral::CoreDao.to_string(), "CoreDAO");
    }

    #[test]
    fn test_loaned_signature_is_stable() {
        // keccak256 of the canonical signature string
        let sig = loaned_signature();
        assert!(!sig.is_zero());
        assert_eq!(sig, ILendingPool::Loaned::SIGNATURE_HASH);
    }

    #[test]
    fn test_encode_liquidate_layout() {
        let account = Address::repeat_byte(0xAB);
        let call = ILendingPool::liquidateCall {
            account,
            isCore: true,
        };
        let calldata = call.abi_encode();

        // selector + two 32-byte words (address, bool)
        assert_eq!(calldata.len(), 4 + 32 + 32);
        // address is right-aligned in its word
        assert_eq!(&calldata[4 + 12..4 + 32], account.as_slice());
        // bool occupies the last byte of its word
        assert_eq!(calldata[4 + 63], 1);
    }
}
