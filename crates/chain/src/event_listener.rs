//! Loan event ingestion: historical backfill and live subscription.

use std::pin::Pin;

use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Filter, Log};
use anyhow::Result;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, info};

use crate::contracts::{loaned_signature, Collateral};

/// A parsed `Loaned` event.
#[derive(Debug, Clone)]
pub struct LoanEvent {
    /// Borrower account
    pub account: Address,
    /// Lender that originated the loan
    pub lender: Address,
    /// Loan principal
    pub principal: U256,
    /// Collateral amount backing the loan
    pub collateral_amount: U256,
    /// Collateral type backing the loan
    pub collateral: Collateral,
    /// Block number
    pub block_number: u64,
    /// Transaction hash
    pub tx_hash: B256,
}

/// Watches one lending pool contract for `Loaned` events.
pub struct EventListener {
    /// RPC endpoint URL
    rpc_url: String,
    /// Pool contract address
    contract: Address,
}

impl EventListener {
    /// Create a new event listener.
    pub fn new(rpc_url: impl Into<String>, contract: Address) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            contract,
        }
    }

    fn loan_filter(&self) -> Filter {
        Filter::new()
            .address(self.contract)
            .event_signature(loaned_signature())
    }

    /// Fetch all `Loaned` events in `[from_block, to_block]`.
    ///
    /// Reorged-out logs are dropped before parsing.
    pub async fn backfill(&self, from_block: u64, to_block: u64) -> Result<Vec<LoanEvent>> {
        info!(
            contract = %self.contract,
            from_block,
            to_block,
            "Fetching past Loaned events"
        );

        let provider = ProviderBuilder::new().on_builtin(&self.rpc_url).await?;
        let filter = self.loan_filter().from_block(from_block).to_block(to_block);
        let logs = provider.get_logs(&filter).await?;

        let events = parse_settled_logs(logs);
        debug!(count = events.len(), "Parsed historical loan events");

        Ok(events)
    }

    /// Stream live `Loaned` events.
    ///
    /// WebSocket endpoints get a real `eth_subscribe` subscription; HTTP
    /// endpoints fall back to an installed log filter polled for changes,
    /// which is what the original filter-based listeners do anyway.
    pub async fn subscribe(&self) -> Result<Pin<Box<dyn Stream<Item = LoanEvent> + Send>>> {
        if self.rpc_url.starts_with("ws") {
            self.subscribe_push().await
        } else {
            self.subscribe_poll().await
        }
    }

    async fn subscribe_push(&self) -> Result<Pin<Box<dyn Stream<Item = LoanEvent> + Send>>> {
        info!(ws_url = %self.rpc_url, contract = %self.contract, "Subscribing to Loaned events");

        let ws = WsConnect::new(&self.rpc_url);
        let provider = ProviderBuilder::new().on_ws(ws).await?;
        info!("WebSocket connected for loan events");

        let sub = provider.subscribe_logs(&self.loan_filter()).await?;
        let inner_stream = sub.into_stream();

        // The provider must be kept in the stream's state to prevent the
        // WebSocket from closing.
        let event_stream = futures::stream::unfold(
            (provider, inner_stream),
            |(provider, mut stream)| async move {
                loop {
                    match stream.next().await {
                        Some(log) => {
                            if !log.removed {
                                if let Some(event) = parse_loan_event(log) {
                                    return Some((event, (provider, stream)));
                                }
                            }
                            // Skip unparseable or reorged-out logs
                        }
                        None => return None,
                    }
                }
            },
        );

        Ok(Box::pin(event_stream))
    }

    async fn subscribe_poll(&self) -> Result<Pin<Box<dyn Stream<Item = LoanEvent> + Send>>> {
        info!(rpc_url = %self.rpc_url, contract = %self.contract, "Polling for Loaned events");

        let provider = ProviderBuilder::new().on_builtin(&self.rpc_url).await?;
        let poller = provider.watch_logs(&self.loan_filter()).await?;
        let inner_stream = poller.into_stream().flat_map(stream::iter);

        // The poller only holds a weak handle on the RPC client, so the
        // provider must be kept in the stream's state as well.
        let event_stream = futures::stream::unfold(
            (provider, Box::pin(inner_stream)),
            |(provider, mut stream)| async move {
                loop {
                    match stream.next().await {
                        Some(log) => {
                            if !log.removed {
                                if let Some(event) = parse_loan_event(log) {
                                    return Some((event, (provider, stream)));
                                }
                            }
                        }
                        None => return None,
                    }
                }
            },
        );

        Ok(Box::pin(event_stream))
    }
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("rpc_url", &self.rpc_url)
            .field("contract", &self.contract)
            .finish()
    }
}

/// Drop reorged-out logs and parse the rest.
fn parse_settled_logs(logs: Vec<Log>) -> Vec<LoanEvent> {
    logs.into_iter()
        .filter(|log| !log.removed)
        .filter_map(parse_loan_event)
        .collect()
}

/// Parse a log into a LoanEvent.
/// Loaned(address indexed account, address indexed lender, uint256 principal, uint256 collateral, bool isCore)
fn parse_loan_event(log: Log) -> Option<LoanEvent> {
    if log.topics().len() < 3 {
        return None;
    }

    // Addresses are right-aligned in their topic words; taking the low 20
    // bytes normalizes away the zero padding.
    let account = Address::from_slice(&log.topics()[1][12..]);
    let lender = Address::from_slice(&log.topics()[2][12..]);

    // Data: principal (uint256), collateral (uint256), isCore (bool)
    if log.data().data.len() < 96 {
        return None;
    }

    let principal = U256::from_be_slice(&log.data().data[0..32]);
    let collateral_amount = U256::from_be_slice(&log.data().data[32..64]);
    let is_core = log.data().data[95] != 0;

    Some(LoanEvent {
        account,
        lender,
        principal,
        collateral_amount,
        collateral: Collateral::from_flag(is_core),
        block_number: log.block_number.unwrap_or(0),
        tx_hash: log.transaction_hash.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::LogData;

    fn loan_log(account_word: B256, removed: bool) -> Log {
        let topics = vec![
            loaned_signature(),
            account_word,
            Address::repeat_byte(0x99).into_word(),
        ];
        let mut data = vec![0u8; 96];
        data[31] = 100; // principal
        data[63] = 50; // collateral amount
        data[95] = 1; // isCore

        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x10),
                data: LogData::new_unchecked(topics, data.into()),
            },
            block_hash: None,
            block_number: Some(7),
            block_timestamp: None,
            transaction_hash: Some(B256::repeat_byte(2)),
            transaction_index: None,
            log_index: None,
            removed,
        }
    }

    #[test]
    fn test_parse_loan_event() {
        let account = Address::repeat_byte(0xAA);
        let event = parse_loan_event(loan_log(account.into_word(), false)).unwrap();

        assert_eq!(event.account, account);
        assert_eq!(event.lender, Address::repeat_byte(0x99));
        assert_eq!(event.principal, U256::from(100u64));
        assert_eq!(event.collateral_amount, U256::from(50u64));
        assert_eq!(event.collateral, Collateral::Core);
        assert_eq!(event.block_number, 7);
    }

    #[test]
    fn test_parse_normalizes_topic_padding() {
        // A low-valued address leaves 31 zero bytes of padding in its topic.
        let mut word = [0u8; 32];
        word[31] = 0x0A;
        let event = parse_loan_event(loan_log(B256::from(word), false)).unwrap();

        let mut expected = [0u8; 20];
        expected[19] = 0x0A;
        assert_eq!(event.account, Address::from(expected));
    }

    #[test]
    fn test_parse_rejects_short_logs() {
        let mut log = loan_log(Address::repeat_byte(0xAA).into_word(), false);
        log.inner.data = LogData::new_unchecked(vec![loaned_signature()], vec![0u8; 96].into());
        assert!(parse_loan_event(log).is_none());
    }

    #[test]
    fn test_settled_logs_drop_removed() {
        let kept = Address::repeat_byte(0xAA);
        let reorged = Address::repeat_byte(0xBB);
        let logs = vec![
            loan_log(kept.into_word(), false),
            loan_log(reorged.into_word(), true),
        ];

        let events = parse_settled_logs(logs);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].account, kept);
    }

    #[test]
    fn test_parse_log_from_wire_json() {
        let mut data = vec![0u8; 96];
        data[31] = 1;

        let value = serde_json::json!({
            "address": "0x1010101010101010101010101010101010101010",
            "topics": [
                loaned_signature().to_string(),
                "0x000000000000000000000000000000000000000000000000000000000000000a",
                Address::repeat_byte(0x99).into_word().to_string(),
            ],
            "data": format!("0x{}", hex::encode(&data)),
            "blockHash": B256::repeat_byte(3).to_string(),
            "blockNumber": "0x2a",
            "transactionHash": B256::repeat_byte(4).to_string(),
            "transactionIndex": "0x0",
            "logIndex": "0x1",
            "removed": false
        });

        let log: Log = serde_json::from_value(value).unwrap();
        let event = parse_loan_event(log).unwrap();

        let mut expected = [0u8; 20];
        expected[19] = 0x0A;
        assert_eq!(event.account, Address::from(expected));
        assert_eq!(event.block_number, 42);
        assert_eq!(event.collateral, Collateral::CoreDao);
    }
}
