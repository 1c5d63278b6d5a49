//! Transaction signing and submission.
//! Uses Alloy providers for type-safe RPC interactions.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use tracing::{debug, info};

/// Signs and broadcasts transactions for the bot wallet.
///
/// Nonce and fee fields are left to the provider's fill layer.
pub struct TransactionSender {
    /// RPC URL transactions are sent to
    rpc_url: String,
    /// Signing wallet
    wallet: EthereumWallet,
    /// Signer address
    pub address: Address,
}

impl TransactionSender {
    /// Create a new sender from a private key (with or without `0x` prefix).
    pub fn new(private_key: &str, rpc_url: impl Into<String>) -> Result<Self> {
        let key_str = private_key.trim_start_matches("0x");
        let signer: PrivateKeySigner = key_str.parse()?;
        let address = signer.address();

        Ok(Self {
            rpc_url: rpc_url.into(),
            wallet: EthereumWallet::from(signer),
            address,
        })
    }

    /// The RPC URL this sender submits to.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Sign and broadcast a transaction, returning its hash.
    ///
    /// Resolves at broadcast; callers that care about inclusion watch the
    /// hash themselves.
    pub async fn send(&self, to: Address, calldata: Bytes, gas_limit: u64) -> Result<B256> {
        debug!(
            to = %to,
            calldata_len = calldata.len(),
            gas_limit,
            "Preparing transaction"
        );

        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata)
            .with_gas_limit(gas_limit);

        let provider = ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .on_builtin(&self.rpc_url)
            .await?;

        let pending = provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();

        info!(tx_hash = %tx_hash, to = %to, "Transaction broadcast");

        Ok(tx_hash)
    }
}

impl std::fmt::Debug for TransactionSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSender")
            .field("address", &self.address)
            .field("rpc_url", &self.rpc_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_derives_address() {
        // Well-known test private key (DO NOT USE IN PRODUCTION)
        let private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let sender = TransactionSender::new(private_key, "http://localhost:8545").unwrap();

        assert_eq!(
            format!("{:?}", sender.address).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_sender_accepts_unprefixed_key() {
        let private_key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        assert!(TransactionSender::new(private_key, "http://localhost:8545").is_ok());
    }

    #[test]
    fn test_sender_rejects_garbage_key() {
        assert!(TransactionSender::new("not-a-key", "http://localhost:8545").is_err());
    }
}
