use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const RPC_URL_ENV: &str = "TXN_RPC_URL";
pub const CONTRACT_ADDRESS_ENV: &str = "TXN_CONTRACT_ADDRESS";
pub const DATABASE_URL_ENV: &str = "TXN_DATABASE_URL";
/// Hex private key for the local signer. Never stored in the config file.
pub const PRIVATE_KEY_ENV: &str = "TXN_PRIVATE_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Node connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "NetworkConfig::default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "NetworkConfig::default_chain_id")]
    pub chain_id: u64,
}

impl NetworkConfig {
    fn default_rpc_url() -> String { "http://127.0.0.1:8545".to_string() }
    fn default_chain_id() -> u64 { 31337 }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { rpc_url: Self::default_rpc_url(), chain_id: Self::default_chain_id() }
    }
}

/// Deployed contract and its build artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Address printed by the deploy program. Unset until deployed.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "ContractConfig::default_name")]
    pub name: String,
    #[serde(default = "ContractConfig::default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

impl ContractConfig {
    fn default_name() -> String { "Transactions".to_string() }
    fn default_artifacts_dir() -> PathBuf { PathBuf::from("artifacts/contracts") }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: None,
            name: Self::default_name(),
            artifacts_dir: Self::default_artifacts_dir(),
        }
    }
}

/// Persistent cache location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_database_url")]
    pub database_url: String,
}

impl StorageConfig {
    fn default_database_url() -> String { "sqlite://./data/cache.db?mode=rwc".to_string() }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { database_url: Self::default_database_url() }
    }
}

/// Tunables of the wallet bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Gas limit attached to the value transfer request.
    #[serde(default = "BridgeSettings::default_gas_limit")]
    pub gas_limit: u64,
}

impl BridgeSettings {
    fn default_gas_limit() -> u64 { 21_000 }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self { gas_limit: Self::default_gas_limit() }
    }
}

/// Application configuration, one TOML table per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub bridge: BridgeSettings,
}

impl AppConfig {
    /// Loads the config file (explicit path, then `CONFIG_PATH`, then
    /// `config.toml`) and applies env overrides. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config.toml")),
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
            let parsed = Self::from_toml_str(&content)
                .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
            info!(path = %path.display(), "Loaded configuration");
            parsed
        } else {
            warn!(path = %path.display(), "Config file not found. Using default configuration");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(RPC_URL_ENV) {
            self.network.rpc_url = url;
        }
        if let Ok(address) = std::env::var(CONTRACT_ADDRESS_ENV) {
            self.contract.address = Some(address);
        }
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            self.storage.database_url = url;
        }
    }

    /// Parsed contract address.
    pub fn contract_address(&self) -> Result<Address, ConfigError> {
        let raw = self.contract.address.as_deref().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "contract.address is not set (config file or {})",
                CONTRACT_ADDRESS_ENV
            ))
        })?;
        Address::from_str(raw.trim())
            .map_err(|e| ConfigError::Invalid(format!("contract.address '{}': {}", raw, e)))
    }
}

/// Signing key from the environment, if any.
pub fn private_key_from_env() -> Option<String> {
    std::env::var(PRIVATE_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}
