//! Registry of borrower accounts that may become liquidatable.

use alloy::primitives::Address;
use dashmap::DashSet;

/// Duplicate-free set of borrower accounts.
///
/// The registry only ever grows: accounts stay registered after their loans
/// are repaid or liquidated, and a later sweep simply gets a negative
/// simulation for them. The dedup invariant lives behind
/// [`AccountRegistry::insert`].
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: DashSet<Address>,
}

impl AccountRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account; returns `true` if it was not already present.
    pub fn insert(&self, account: Address) -> bool {
        self.accounts.insert(account)
    }

    /// Whether the account is registered.
    pub fn contains(&self, account: &Address) -> bool {
        self.accounts.contains(account)
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Copy of the current account set.
    ///
    /// A sweep iterates this snapshot; insertions racing the sweep are
    /// picked up by the next one.
    pub fn snapshot(&self) -> Vec<Address> {
        self.accounts.iter().map(|account| *account).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    #[test]
    fn test_insert_deduplicates() {
        let registry = AccountRegistry::new();
        let account = Address::repeat_byte(0xAA);

        assert!(registry.insert(account));
        assert!(!registry.insert(account));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_padded_topics_normalize_to_one_account() {
        // The same address extracted from differently-padded topic words
        // must collapse to a single entry.
        let mut word = [0u8; 32];
        word[31] = 0x0A;
        let from_topic = Address::from_word(B256::from(word));

        let mut raw = [0u8; 20];
        raw[19] = 0x0A;
        let from_bytes = Address::from(raw);

        let registry = AccountRegistry::new();
        registry.insert(from_topic);
        registry.insert(from_bytes);

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_new_account_grows_registry_by_one() {
        let registry = AccountRegistry::new();
        registry.insert(Address::repeat_byte(0xAA));

        let fresh = Address::repeat_byte(0xCC);
        assert!(!registry.contains(&fresh));
        assert!(registry.insert(fresh));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&fresh));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = AccountRegistry::new();
        registry.insert(Address::repeat_byte(0xAA));

        let snapshot = registry.snapshot();
        registry.insert(Address::repeat_byte(0xBB));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }
}
