//! Wallet bridge: connection state, transfer form and transaction history
//! for the `Transactions` contract.

mod context;
pub mod notifier;

pub use context::TransactionBridge;
pub use notifier::{Notifier, RecordingNotifier, TracingNotifier, INSTALL_WALLET_NOTICE};
