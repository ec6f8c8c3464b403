use chrono::Local;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::notifier::{Notifier, TracingNotifier, INSTALL_WALLET_NOTICE};
use crate::blockchain::traits::{methods, TransactionsContract, WalletClient};
use crate::core::config::BridgeSettings;
use crate::core::units;
use crate::core::{
    BridgeError, BridgeState, FormField, TransactionFormData, TransactionRecord,
    TRANSACTION_COUNT_KEY,
};
use crate::storage::KeyValueStore;
use ethers::types::H256;

/// Stateful adapter between a wallet, the `Transactions` contract and a
/// form-driven consumer.
///
/// Every state change is published to [`TransactionBridge::subscribe`]
/// receivers. No lock is held across an await point.
pub struct TransactionBridge {
    wallet: Arc<dyn WalletClient>,
    contract: Arc<dyn TransactionsContract>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    settings: BridgeSettings,
    state: RwLock<BridgeState>,
    updates: watch::Sender<BridgeState>,
}

impl TransactionBridge {
    pub fn new(
        wallet: Arc<dyn WalletClient>,
        contract: Arc<dyn TransactionsContract>,
        store: Arc<dyn KeyValueStore>,
        settings: BridgeSettings,
    ) -> Self {
        let (updates, _) = watch::channel(BridgeState::default());
        Self {
            wallet,
            contract,
            store,
            notifier: Arc::new(TracingNotifier),
            settings,
            state: RwLock::new(BridgeState::default()),
            updates,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn state(&self) -> BridgeState {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BridgeState> {
        self.updates.subscribe()
    }

    pub fn current_account(&self) -> Option<String> {
        self.state.read().current_account.clone()
    }

    pub fn form(&self) -> TransactionFormData {
        self.state.read().form.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn transaction_count(&self) -> Option<u64> {
        self.state.read().transaction_count
    }

    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.read().transactions.clone()
    }

    fn update<F: FnOnce(&mut BridgeState)>(&self, f: F) {
        let snapshot = {
            let mut state = self.state.write();
            f(&mut state);
            state.clone()
        };
        self.updates.send_replace(snapshot);
    }

    /// Emits the install notice when no wallet is reachable.
    fn wallet_missing(&self) -> bool {
        if self.wallet.is_present() {
            return false;
        }
        self.notifier.notify(INSTALL_WALLET_NOTICE);
        true
    }

    fn log_failure(&self, operation: &str, err: BridgeError) -> BridgeError {
        error!(operation, kind = err.kind(), error = %err, "Wallet bridge operation failed");
        err
    }

    async fn request_accounts(&self, method: &str) -> Result<Vec<String>, BridgeError> {
        let accounts = self.wallet.request(method, json!([])).await?;
        debug!(method, accounts = %accounts, "Wallet returned accounts");
        serde_json::from_value(accounts)
            .map_err(|e| BridgeError::InvalidInput(format!("Unexpected accounts payload: {}", e)))
    }

    /// Startup sequence: seed the count from the cache, adopt an already
    /// authorized account, then mirror the on-chain count into the cache.
    pub async fn initialize(&self) -> Result<(), BridgeError> {
        self.load_cached_count().await;
        let connection = self.check_existing_connection().await.map(|_| ());
        let cache = self.prime_transaction_count_cache().await.map(|_| ());
        connection.and(cache)
    }

    async fn load_cached_count(&self) {
        match self.store.get(TRANSACTION_COUNT_KEY).await {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(count) => self.update(|s| s.transaction_count = Some(count)),
                Err(_) => warn!(value = %raw, "Ignoring malformed cached transaction count"),
            },
            Ok(None) => debug!("No cached transaction count"),
            Err(e) => warn!(error = %e, "Failed to read cached transaction count"),
        }
    }

    /// Asks the wallet for account access and adopts the first account.
    pub async fn connect(&self) -> Result<Option<String>, BridgeError> {
        if self.wallet_missing() {
            return Ok(None);
        }

        let accounts = self
            .request_accounts(methods::ETH_REQUEST_ACCOUNTS)
            .await
            .map_err(|e| self.log_failure("connect", e))?;

        match accounts.into_iter().next() {
            Some(account) => {
                info!(account = %account, "Wallet connected");
                self.update(|s| s.current_account = Some(account.clone()));
                Ok(Some(account))
            }
            None => {
                warn!("Wallet granted no accounts");
                Ok(None)
            }
        }
    }

    /// Adopts an already-authorized account without prompting, then refreshes
    /// the history once.
    pub async fn check_existing_connection(&self) -> Result<Option<String>, BridgeError> {
        if self.wallet_missing() {
            return Ok(None);
        }

        let accounts = self
            .request_accounts(methods::ETH_ACCOUNTS)
            .await
            .map_err(|e| self.log_failure("check_existing_connection", e))?;

        let Some(account) = accounts.into_iter().next() else {
            info!("No accounts found");
            return Ok(None);
        };

        info!(account = %account, "Found authorized account");
        self.update(|s| s.current_account = Some(account.clone()));

        // the account stays adopted even if the history cannot be loaded;
        // refresh_transaction_history already logs the failure
        let _ = self.refresh_transaction_history().await;
        Ok(Some(account))
    }

    pub fn update_form_field(&self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        self.update(|s| s.form.set(field, value));
    }

    /// Sends the value transfer through the wallet, records it in the
    /// contract and waits for the record to be mined.
    ///
    /// Returns the hash of the record transaction, or `None` when no wallet is
    /// installed. The form is not validated and not reset.
    pub async fn submit_transaction(&self) -> Result<Option<H256>, BridgeError> {
        if self.wallet_missing() {
            return Ok(None);
        }

        let (form, account, in_flight) = {
            let state = self.state.read();
            (state.form.clone(), state.current_account.clone(), state.is_loading)
        };
        if in_flight {
            warn!("Submitting while a previous transaction is still pending");
        }
        if account.is_none() {
            warn!("Submitting without a connected account");
        }

        self.submit(form, account)
            .await
            .map(Some)
            .map_err(|e| self.log_failure("submit_transaction", e))
    }

    async fn submit(
        &self,
        form: TransactionFormData,
        account: Option<String>,
    ) -> Result<H256, BridgeError> {
        let parsed_amount = units::parse_amount(&form.amount)?;
        debug!(amount = %form.amount, base_units = %parsed_amount, "Parsed transfer amount");

        let transfer = json!([{
            "from": account,
            "to": form.address_to,
            "gas": units::to_hex_quantity(self.settings.gas_limit.into()),
            "value": units::to_hex_quantity(parsed_amount),
        }]);
        let transfer_hash = self.wallet.request(methods::ETH_SEND_TRANSACTION, transfer).await?;
        debug!(transfer_hash = %transfer_hash, "Value transfer accepted by wallet");

        let tx_hash = self
            .contract
            .add_to_blockchain(&form.address_to, parsed_amount, &form.message, &form.keyword)
            .await?;

        self.update(|s| s.is_loading = true);
        info!(tx_hash = ?tx_hash, "Loading");
        let confirmed = self.contract.wait_for_confirmation(tx_hash).await;
        self.update(|s| s.is_loading = false);
        confirmed?;
        info!(tx_hash = ?tx_hash, "Success");

        let count = units::count_to_u64(self.contract.get_transaction_count().await?)?;
        self.update(|s| s.transaction_count = Some(count));
        if let Err(e) = self.store.set(TRANSACTION_COUNT_KEY, &count.to_string()).await {
            warn!(error = %e, "Failed to cache transaction count");
        }
        let _ = self.refresh_transaction_history().await;

        Ok(tx_hash)
    }

    /// Reloads every record from the contract and republishes them.
    pub async fn refresh_transaction_history(&self) -> Result<Vec<TransactionRecord>, BridgeError> {
        if self.wallet_missing() {
            return Ok(Vec::new());
        }

        let raw = self
            .contract
            .get_all_transactions()
            .await
            .map_err(|e| self.log_failure("refresh_transaction_history", e))?;

        let records: Vec<TransactionRecord> =
            raw.iter().map(|t| TransactionRecord::from_raw(t, &Local)).collect();
        debug!(count = records.len(), "Transaction history loaded");

        self.update(|s| s.transactions = records.clone());
        Ok(records)
    }

    /// Writes the on-chain transaction count to the cache.
    pub async fn prime_transaction_count_cache(&self) -> Result<u64, BridgeError> {
        let count = self
            .contract
            .get_transaction_count()
            .await
            .and_then(units::count_to_u64)
            .map_err(|e| self.log_failure("prime_transaction_count_cache", e))?;

        self.store
            .set(TRANSACTION_COUNT_KEY, &count.to_string())
            .await
            .map_err(|e| self.log_failure("prime_transaction_count_cache", e))?;

        debug!(count, "Transaction count cached");
        Ok(count)
    }
}

impl std::fmt::Debug for TransactionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionBridge")
            .field("settings", &self.settings)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
