pub mod config;
pub mod domain;
pub mod errors;
pub mod units;

pub use domain::{
    BridgeState, FormField, RawTransaction, TransactionFormData, TransactionRecord,
    TRANSACTION_COUNT_KEY,
};
pub use errors::BridgeError;
