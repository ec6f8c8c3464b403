use async_trait::async_trait;
use ethers::types::{H256, U256};
use serde_json::Value;

use crate::core::{BridgeError, RawTransaction};

/// EIP-1193 method names used by the bridge.
pub mod methods {
    /// Lists already-authorized accounts without prompting.
    pub const ETH_ACCOUNTS: &str = "eth_accounts";
    /// Asks the user to authorize accounts.
    pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
}

/// A wallet reachable through an EIP-1193 style `request` call.
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// Whether a wallet is reachable at all. Probed before every use.
    fn is_present(&self) -> bool;

    /// Sends `{ method, params }` to the wallet and returns its JSON result.
    async fn request(&self, method: &str, params: Value) -> Result<Value, BridgeError>;
}

/// The deployed `Transactions` contract.
#[async_trait]
pub trait TransactionsContract: Send + Sync {
    /// Every recorded transfer, in insertion order.
    async fn get_all_transactions(&self) -> Result<Vec<RawTransaction>, BridgeError>;

    /// Submits `addToBlockchain` and returns the pending transaction hash.
    async fn add_to_blockchain(
        &self,
        address_to: &str,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> Result<H256, BridgeError>;

    /// Resolves once `tx_hash` is mined. A reverted receipt is an error.
    async fn wait_for_confirmation(&self, tx_hash: H256) -> Result<(), BridgeError>;

    async fn get_transaction_count(&self) -> Result<U256, BridgeError>;
}

/// Wallet used when nothing is configured; always reports absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWallet;

#[async_trait]
impl WalletClient for NoWallet {
    fn is_present(&self) -> bool {
        false
    }

    async fn request(&self, method: &str, _params: Value) -> Result<Value, BridgeError> {
        Err(BridgeError::WalletUnavailable(format!("no wallet to handle {}", method)))
    }
}
