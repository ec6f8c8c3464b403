use thiserror::Error;

/// Boxed cause carried by errors that wrap a lower-level failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for every bridge operation.
///
/// The first four variants classify failures coming from outside the crate
/// (wallet, node, contract). `InvalidInput` and `Storage` cover local failures.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No wallet is reachable, or the wallet reports it is disconnected.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The wallet user declined the request.
    #[error("Request rejected by user: {0}")]
    UserRejected(String),

    /// Transport or node failure.
    #[error("Network failure: {message}")]
    NetworkFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The contract call executed and reverted.
    #[error("Contract reverted: {0}")]
    ContractReverted(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BridgeError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure { message: message.into(), source: None }
    }

    pub fn network_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::NetworkFailure { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Classifies a JSON-RPC / EIP-1193 error object.
    pub fn from_rpc_error(code: i64, message: &str) -> Self {
        match code {
            // EIP-1193: user rejected request / unauthorized
            4001 | 4100 => Self::UserRejected(message.to_string()),
            // EIP-1193: disconnected / chain disconnected
            4900 | 4901 => Self::WalletUnavailable(message.to_string()),
            // execution reverted
            3 => Self::ContractReverted(message.to_string()),
            -32000 if message.contains("revert") => Self::ContractReverted(message.to_string()),
            _ => Self::network(format!("JSON-RPC error {}: {}", code, message)),
        }
    }

    /// Short stable label, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WalletUnavailable(_) => "wallet_unavailable",
            Self::UserRejected(_) => "user_rejected",
            Self::NetworkFailure { .. } => "network_failure",
            Self::ContractReverted(_) => "contract_reverted",
            Self::InvalidInput(_) => "invalid_input",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether repeating the same call could succeed. Nothing in this crate
    /// retries; callers decide.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. })
    }
}

impl From<sqlx::Error> for BridgeError {
    fn from(err: sqlx::Error) -> Self {
        BridgeError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::InvalidInput(err.to_string())
    }
}
