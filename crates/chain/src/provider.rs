//! Provider management for the RPC endpoint.
//! Uses Alloy providers for type-safe RPC interactions.

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::Result;
use tracing::info;

/// Provider manager for the configured RPC endpoint.
///
/// Providers are built per call from the stored URL; the URL scheme
/// (http(s) or ws(s)) selects the transport.
#[derive(Clone)]
pub struct ProviderManager {
    /// RPC endpoint URL
    rpc_url: String,
}

impl ProviderManager {
    /// Create a new provider manager and verify the endpoint is reachable.
    pub async fn connect(rpc_url: impl Into<String>) -> Result<Self> {
        let rpc_url = rpc_url.into();

        let provider = ProviderBuilder::new().on_builtin(&rpc_url).await?;
        let block = provider.get_block_number().await?;
        info!(block, "Provider connection verified");

        Ok(Self { rpc_url })
    }

    /// The configured RPC URL.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Get the current block number.
    pub async fn block_number(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().on_builtin(&self.rpc_url).await?;
        let block = provider.get_block_number().await?;
        Ok(block)
    }
}

impl std::fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderManager")
            .field("rpc_url", &self.rpc_url)
            .finish()
    }
}
