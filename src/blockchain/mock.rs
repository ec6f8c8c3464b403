//! In-memory wallet and contract doubles. Both record every call so callers
//! can assert on what reached them.

use async_trait::async_trait;
use ethers::types::{H256, U256};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

use super::traits::{methods, TransactionsContract, WalletClient};
use crate::core::{BridgeError, RawTransaction};

/// Failure a mock can be scripted to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    UserRejected,
    Network,
    Reverted,
}

impl MockFailure {
    fn to_error(self, context: &str) -> BridgeError {
        match self {
            MockFailure::UserRejected => {
                BridgeError::UserRejected(format!("{}: user rejected the request", context))
            }
            MockFailure::Network => BridgeError::network(format!("{}: connection reset", context)),
            MockFailure::Reverted => BridgeError::ContractReverted(format!("{}: reverted", context)),
        }
    }
}

/// A request the mock wallet received.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletRequest {
    pub method: String,
    pub params: Value,
}

/// Scripted EIP-1193 wallet.
#[derive(Debug, Default)]
pub struct MockWallet {
    absent: bool,
    grantable: Vec<String>,
    authorized: Mutex<Vec<String>>,
    failure: Mutex<Option<MockFailure>>,
    requests: Mutex<Vec<WalletRequest>>,
    sent: AtomicUsize,
}

impl MockWallet {
    /// A wallet that is not installed.
    pub fn absent() -> Self {
        Self { absent: true, ..Default::default() }
    }

    /// Installed wallet that grants `accounts` on `eth_requestAccounts`
    /// but has none authorized yet.
    pub fn with_accounts<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { grantable: accounts.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    /// Installed wallet whose `accounts` are already authorized.
    pub fn authorized<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let wallet = Self::with_accounts(accounts);
        *wallet.authorized.lock() = wallet.grantable.clone();
        wallet
    }

    /// Makes every subsequent request fail.
    pub fn fail_with(self, failure: MockFailure) -> Self {
        *self.failure.lock() = Some(failure);
        self
    }

    pub fn requests(&self) -> Vec<WalletRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_for(&self, method: &str) -> Vec<WalletRequest> {
        self.requests.lock().iter().filter(|r| r.method == method).cloned().collect()
    }
}

#[async_trait]
impl WalletClient for MockWallet {
    fn is_present(&self) -> bool {
        !self.absent
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        self.requests.lock().push(WalletRequest { method: method.to_string(), params });

        if self.absent {
            return Err(BridgeError::WalletUnavailable("mock wallet not installed".into()));
        }
        if let Some(failure) = *self.failure.lock() {
            return Err(failure.to_error(method));
        }

        match method {
            methods::ETH_ACCOUNTS => Ok(json!(*self.authorized.lock())),
            methods::ETH_REQUEST_ACCOUNTS => {
                let mut authorized = self.authorized.lock();
                *authorized = self.grantable.clone();
                Ok(json!(*authorized))
            }
            methods::ETH_SEND_TRANSACTION => {
                let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(json!(format!("{:?}", H256::from_low_u64_be(n as u64))))
            }
            other => Err(BridgeError::network(format!("mock wallet: unsupported method {}", other))),
        }
    }
}

/// In-memory `Transactions` contract.
#[derive(Debug)]
pub struct MockTransactionsContract {
    sender: String,
    block_timestamp: u64,
    ledger: Mutex<Vec<RawTransaction>>,
    count: Mutex<u64>,
    failure: Mutex<Option<MockFailure>>,
    confirm_failure: Mutex<Option<MockFailure>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    history_calls: AtomicUsize,
    submitted: AtomicUsize,
}

impl Default for MockTransactionsContract {
    fn default() -> Self {
        Self {
            sender: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            block_timestamp: 1_700_000_000,
            ledger: Mutex::new(Vec::new()),
            count: Mutex::new(0),
            failure: Mutex::new(None),
            confirm_failure: Mutex::new(None),
            gate: Mutex::new(None),
            history_calls: AtomicUsize::new(0),
            submitted: AtomicUsize::new(0),
        }
    }
}

impl MockTransactionsContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the on-chain counter without adding ledger entries.
    pub fn with_count(self, count: u64) -> Self {
        *self.count.lock() = count;
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn with_records(self, records: Vec<RawTransaction>) -> Self {
        *self.count.lock() = records.len() as u64;
        *self.ledger.lock() = records;
        self
    }

    /// Makes every contract call fail.
    pub fn fail_with(self, failure: MockFailure) -> Self {
        *self.failure.lock() = Some(failure);
        self
    }

    /// Makes confirmations fail while submissions still succeed.
    pub fn fail_confirmation_with(self, failure: MockFailure) -> Self {
        *self.confirm_failure.lock() = Some(failure);
        self
    }

    /// Holds the next confirmation until the returned sender fires (or is dropped).
    pub fn gate_confirmation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock() = Some(rx);
        tx
    }

    pub fn records(&self) -> Vec<RawTransaction> {
        self.ledger.lock().clone()
    }

    pub fn count(&self) -> u64 {
        *self.count.lock()
    }

    /// Number of `getAllTransactions` calls served.
    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// Number of `addToBlockchain` calls accepted.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    fn check(&self, context: &str) -> Result<(), BridgeError> {
        match *self.failure.lock() {
            Some(failure) => Err(failure.to_error(context)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TransactionsContract for MockTransactionsContract {
    async fn get_all_transactions(&self) -> Result<Vec<RawTransaction>, BridgeError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.check("getAllTransactions")?;
        Ok(self.ledger.lock().clone())
    }

    async fn add_to_blockchain(
        &self,
        address_to: &str,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> Result<H256, BridgeError> {
        self.check("addToBlockchain")?;
        if address_to.trim().is_empty() {
            return Err(BridgeError::InvalidInput("Invalid recipient address ''".into()));
        }

        let mut ledger = self.ledger.lock();
        ledger.push(RawTransaction {
            sender: self.sender.clone(),
            receiver: address_to.to_string(),
            amount,
            message: message.to_string(),
            timestamp: U256::from(self.block_timestamp),
            keyword: keyword.to_string(),
        });
        *self.count.lock() += 1;
        let n = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(H256::from_low_u64_be(0x1000 + n as u64))
    }

    async fn wait_for_confirmation(&self, _tx_hash: H256) -> Result<(), BridgeError> {
        let gate = self.gate.lock().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        match *self.confirm_failure.lock() {
            Some(failure) => Err(failure.to_error("confirmation")),
            None => Ok(()),
        }
    }

    async fn get_transaction_count(&self) -> Result<U256, BridgeError> {
        self.check("getTransactionCount")?;
        Ok(U256::from(*self.count.lock()))
    }
}
