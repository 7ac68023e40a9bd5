//! Accounts store
//!
//! Accounts, institutions and currencies persisted together under one key.
//! Bumping [`ACCOUNTS_STORE_VERSION`] resets all three slices to seed data on
//! the next start; stored user data is not carried forward.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use smartspend_storage::KeyValueStorage;
use smartspend_store::{
    fill_if_empty, PersistHandle, PersistentStore, Rehydration, Slice, StoreError, StoreOptions,
    StorePhase, StoreState,
};

use crate::models::{Account, Currency, Institution};
use crate::seed;
use crate::Result;

pub const ACCOUNTS_STORE_VERSION: u32 = 2;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsState {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub institutions: Vec<Institution>,
    #[serde(default)]
    pub currencies: Vec<Currency>,
}

impl StoreState for AccountsState {
    fn seed() -> Self {
        Self {
            accounts: seed::accounts(),
            institutions: seed::institutions(),
            currencies: seed::currencies(),
        }
    }

    fn slice_lengths(&self) -> Vec<(&'static str, usize)> {
        vec![
            (ACCOUNTS.name(), self.accounts.len()),
            (INSTITUTIONS.name(), self.institutions.len()),
            (CURRENCIES.name(), self.currencies.len()),
        ]
    }

    fn seed_empty(&mut self) -> Vec<&'static str> {
        let mut seeded = Vec::new();
        if fill_if_empty(&mut self.accounts, seed::accounts) {
            seeded.push(ACCOUNTS.name());
        }
        if fill_if_empty(&mut self.institutions, seed::institutions) {
            seeded.push(INSTITUTIONS.name());
        }
        if fill_if_empty(&mut self.currencies, seed::currencies) {
            seeded.push(CURRENCIES.name());
        }
        seeded
    }
}

fn accounts(s: &AccountsState) -> &Vec<Account> {
    &s.accounts
}

fn accounts_mut(s: &mut AccountsState) -> &mut Vec<Account> {
    &mut s.accounts
}

fn institutions(s: &AccountsState) -> &Vec<Institution> {
    &s.institutions
}

fn institutions_mut(s: &mut AccountsState) -> &mut Vec<Institution> {
    &mut s.institutions
}

fn currencies(s: &AccountsState) -> &Vec<Currency> {
    &s.currencies
}

fn currencies_mut(s: &mut AccountsState) -> &mut Vec<Currency> {
    &mut s.currencies
}

pub const ACCOUNTS: Slice<AccountsState, Account> = Slice::new("accounts", accounts, accounts_mut);
pub const INSTITUTIONS: Slice<AccountsState, Institution> =
    Slice::new("institutions", institutions, institutions_mut);
pub const CURRENCIES: Slice<AccountsState, Currency> =
    Slice::new("currencies", currencies, currencies_mut);

pub struct AccountsStore {
    store: PersistentStore<AccountsState>,
}

impl AccountsStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            store: PersistentStore::new(
                storage,
                StoreOptions::new(key, ACCOUNTS_STORE_VERSION),
            ),
        }
    }

    pub fn with_error_hook<F>(self, hook: F) -> Self
    where
        F: Fn(&StoreError) + Send + Sync + 'static,
    {
        Self {
            store: self.store.with_error_hook(hook),
        }
    }

    pub async fn rehydrate(&self) -> Result<Rehydration> {
        Ok(self.store.rehydrate().await?)
    }

    pub fn phase(&self) -> StorePhase {
        self.store.phase()
    }

    // === Reads ===

    pub fn accounts(&self) -> Vec<Account> {
        self.store.slice(&ACCOUNTS)
    }

    pub fn institutions(&self) -> Vec<Institution> {
        self.store.slice(&INSTITUTIONS)
    }

    pub fn currencies(&self) -> Vec<Currency> {
        self.store.slice(&CURRENCIES)
    }

    pub fn account_by_id(&self, id: &str) -> Option<Account> {
        self.store.get_by_id(&ACCOUNTS, id)
    }

    pub fn institution_by_id(&self, id: &str) -> Option<Institution> {
        self.store.get_by_id(&INSTITUTIONS, id)
    }

    pub fn currency_by_id(&self, id: &str) -> Option<Currency> {
        self.store.get_by_id(&CURRENCIES, id)
    }

    /// Institution an account belongs to, if it has one and it still exists.
    pub fn institution_for(&self, account: &Account) -> Option<Institution> {
        account
            .institution_id
            .as_deref()
            .and_then(|id| self.institution_by_id(id))
    }

    // === Writes ===

    pub fn set_accounts(&self, accounts: Vec<Account>) -> Result<PersistHandle> {
        Ok(self.store.set_slice(&ACCOUNTS, accounts)?)
    }

    pub fn set_institutions(&self, institutions: Vec<Institution>) -> Result<PersistHandle> {
        Ok(self.store.set_slice(&INSTITUTIONS, institutions)?)
    }

    pub fn set_currencies(&self, currencies: Vec<Currency>) -> Result<PersistHandle> {
        Ok(self.store.set_slice(&CURRENCIES, currencies)?)
    }

    /// Replace the account with the same id in place, or append it.
    pub fn upsert_account(&self, account: Account) -> Result<PersistHandle> {
        let handle = self.store.update(|state| {
            match state.accounts.iter_mut().find(|a| a.id == account.id) {
                Some(existing) => *existing = account,
                None => state.accounts.push(account),
            }
        })?;
        Ok(handle)
    }

    /// Returns `None` without writing when no account has `id`.
    pub fn remove_account(&self, id: &str) -> Result<Option<PersistHandle>> {
        if self.account_by_id(id).is_none() {
            return Ok(None);
        }

        let handle = self
            .store
            .update(|state| state.accounts.retain(|a| a.id != id))?;
        tracing::info!(account_id = %id, "Removed account");
        Ok(Some(handle))
    }
}

impl Clone for AccountsStore {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ACCOUNTS_STORE_KEY;
    use crate::models::AccountKind;
    use smartspend_storage::{Database, SqliteStorage};
    use smartspend_store::RehydrationSource;

    fn store_on(db: &Database) -> AccountsStore {
        AccountsStore::new(
            Arc::new(SqliteStorage::new(db.clone())),
            ACCOUNTS_STORE_KEY,
        )
    }

    fn stored_envelope(db: &Database) -> serde_json::Value {
        let raw = db.get_item(ACCOUNTS_STORE_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_first_run_then_restart() {
        let db = Database::open_in_memory().unwrap();

        let store = store_on(&db);
        store.rehydrate().await.unwrap().finish().await.unwrap();
        assert_eq!(store.accounts(), seed::accounts());
        assert_eq!(store.institutions(), seed::institutions());
        assert_eq!(store.currencies(), seed::currencies());

        let mut updated = store.accounts();
        updated.truncate(2);
        updated[0].balance_minor = 42;
        store
            .set_accounts(updated.clone())
            .unwrap()
            .wait()
            .await
            .unwrap();

        let restarted = store_on(&db);
        let rehydration = restarted.rehydrate().await.unwrap();
        assert_eq!(rehydration.source(), RehydrationSource::Stored);
        assert_eq!(restarted.phase(), StorePhase::Ready);
        assert_eq!(restarted.accounts(), updated);
        assert_eq!(restarted.institutions(), seed::institutions());
        assert_eq!(restarted.currencies(), seed::currencies());
        assert_eq!(
            stored_envelope(&db)["version"],
            serde_json::json!(ACCOUNTS_STORE_VERSION)
        );
    }

    #[tokio::test]
    async fn test_version_one_envelope_is_reset() {
        let db = Database::open_in_memory().unwrap();
        db.put_item(
            ACCOUNTS_STORE_KEY,
            r#"{"version":1,"state":{"accounts":[{"id":"old","name":"Old"}]}}"#,
        )
        .unwrap();

        let store = store_on(&db);
        let rehydration = store.rehydrate().await.unwrap();

        assert_eq!(rehydration.source(), RehydrationSource::Migrated { from: 1 });
        assert_eq!(store.accounts(), seed::accounts());
        assert_eq!(stored_envelope(&db)["version"], serde_json::json!(2));
        assert_eq!(
            stored_envelope(&db)["state"]["currencies"]
                .as_array()
                .map(Vec::len),
            Some(seed::currencies().len())
        );
    }

    #[tokio::test]
    async fn test_envelope_wire_shape() {
        let db = Database::open_in_memory().unwrap();
        let store = store_on(&db);
        store.rehydrate().await.unwrap().finish().await.unwrap();

        let envelope = stored_envelope(&db);
        let state = envelope["state"].as_object().unwrap();
        let mut keys: Vec<_> = state.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["accounts", "currencies", "institutions"]);
        assert_eq!(state["accounts"][0]["id"], "acc-salary");
    }

    #[tokio::test]
    async fn test_institution_lookup() {
        let db = Database::open_in_memory().unwrap();
        let store = store_on(&db);

        assert!(store.institution_by_id("inst-hdfc").is_none());
        store.rehydrate().await.unwrap().finish().await.unwrap();

        let salary = store.account_by_id("acc-salary").unwrap();
        let bank = store.institution_for(&salary).unwrap();
        assert_eq!(bank.name, "HDFC Bank");

        let cash = store.account_by_id("acc-cash").unwrap();
        assert!(store.institution_for(&cash).is_none());
        assert!(store.institution_by_id("inst-missing").is_none());
        assert_eq!(store.currency_by_id("cur-usd").unwrap().code, "USD");
    }

    #[tokio::test]
    async fn test_upsert_and_remove_account() {
        let db = Database::open_in_memory().unwrap();
        let store = store_on(&db);
        store.rehydrate().await.unwrap().finish().await.unwrap();

        let card = Account::new(
            "Travel Card".to_string(),
            AccountKind::CreditCard,
            "cur-usd".to_string(),
        )
        .with_institution("inst-icici");
        store.upsert_account(card.clone()).unwrap().wait().await.unwrap();
        assert_eq!(store.accounts().len(), seed::accounts().len() + 1);

        let mut renamed = card.clone();
        renamed.name = "Travel Visa".to_string();
        store.upsert_account(renamed).unwrap().wait().await.unwrap();
        assert_eq!(store.accounts().len(), seed::accounts().len() + 1);
        assert_eq!(store.account_by_id(&card.id).unwrap().name, "Travel Visa");

        store
            .remove_account(&card.id)
            .unwrap()
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert!(store.account_by_id(&card.id).is_none());
        assert!(store.remove_account(&card.id).unwrap().is_none());

        let restarted = store_on(&db);
        restarted.rehydrate().await.unwrap();
        assert_eq!(restarted.accounts(), seed::accounts());
    }

    #[test]
    fn test_seed_empty_is_idempotent() {
        let mut state = AccountsState::default();
        assert_eq!(
            state.seed_empty(),
            vec!["accounts", "institutions", "currencies"]
        );
        assert_eq!(state, AccountsState::seed());
        assert!(state.seed_empty().is_empty());
        assert!(state.empty_slices().is_empty());
    }
}
