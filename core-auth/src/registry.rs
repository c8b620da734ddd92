//! Fixed, ordered table of provider accounts.

use crate::error::{AuthError, Result};
use crate::types::{Account, AccountId};
use core_runtime::config::AppConfig;

/// Immutable list of accounts; position is the public account index.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let accounts = config
            .accounts
            .iter()
            .enumerate()
            .map(|(index, account)| Account {
                id: AccountId::new(index),
                redirect_uri: account.redirect_uri.clone(),
                credential_key: account.credential_key.clone(),
            })
            .collect();
        Self { accounts }
    }

    /// Resolve a caller-supplied index.
    ///
    /// # Errors
    ///
    /// `AccountOutOfRange` if `index` is negative or not below [`len`](Self::len).
    pub fn lookup(&self, index: i64) -> Result<&Account> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.accounts.get(i))
            .ok_or(AuthError::AccountOutOfRange {
                index,
                count: self.accounts.len(),
            })
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(count: usize) -> AccountRegistry {
        let config = AppConfig::builder()
            .client_id("client")
            .client_secret("secret")
            .account_count(count)
            .build()
            .unwrap();
        AccountRegistry::from_config(&config)
    }

    #[test]
    fn test_lookup_in_range() {
        let registry = registry(15);

        let first = registry.lookup(0).unwrap();
        assert_eq!(first.id, AccountId::new(0));
        assert_eq!(first.credential_key, "creds_account1.json");

        let last = registry.lookup(14).unwrap();
        assert_eq!(last.credential_key, "creds_account15.json");
        assert_eq!(last.redirect_uri, "http://localhost:3000/google/redirect/14");
    }

    #[test]
    fn test_lookup_out_of_range() {
        let registry = registry(15);

        for index in [15, 99, -1, i64::MIN] {
            match registry.lookup(index) {
                Err(AuthError::AccountOutOfRange { index: got, count }) => {
                    assert_eq!(got, index);
                    assert_eq!(count, 15);
                }
                other => panic!("expected out of range for {}, got {:?}", index, other),
            }
        }
    }

    #[test]
    fn test_iteration_order() {
        let registry = registry(3);
        let ids: Vec<usize> = registry.iter().map(|a| a.id.index()).collect();

        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
        assert!(registry.get(AccountId::new(3)).is_none());
    }
}
