use anyhow::{Context, Result};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::LocalWallet,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::blockchain::ethereum::{http_provider, local_wallet};
use crate::blockchain::{
    EthersTransactionsContract, RpcWallet, SignerWallet, TransactionsContract, WalletClient,
};
use crate::bridge::TransactionBridge;
use crate::core::config::{private_key_from_env, AppConfig, PRIVATE_KEY_ENV};
use crate::deploy::ArtifactFactoryProvider;
use crate::storage::{KeyValueStore, SqliteStore};

/// Installs the global tracing subscriber. Logs go to stderr so stdout stays
/// reserved for command output.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,hyper=info,h2=info,sqlx=warn")
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Builds a bridge against the configured node and contract.
///
/// With `TXN_PRIVATE_KEY` set the bridge signs locally; otherwise it relies on
/// accounts managed by the node.
pub async fn build_bridge(config: &AppConfig) -> Result<TransactionBridge> {
    let address = config.contract_address()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteStore::new_with_url(&config.storage.database_url)
            .await
            .context("Failed to open cache storage")?,
    );
    let provider = http_provider(&config.network.rpc_url)?;

    let (wallet, contract): (Arc<dyn WalletClient>, Arc<dyn TransactionsContract>) =
        match private_key_from_env() {
            Some(key) => {
                let signer = local_wallet(&key, config.network.chain_id)?;
                let client = Arc::new(SignerMiddleware::new(provider.clone(), signer.clone()));
                (
                    Arc::new(SignerWallet::new(provider, signer)),
                    Arc::new(EthersTransactionsContract::new(address, client)),
                )
            }
            None => {
                let sender = match provider.get_accounts().await {
                    Ok(accounts) => accounts.into_iter().next(),
                    Err(e) => {
                        warn!(error = %e, "Could not list node accounts");
                        None
                    }
                };
                let contract_client = match sender {
                    Some(sender) => provider.clone().with_sender(sender),
                    None => provider.clone(),
                };
                (
                    Arc::new(RpcWallet::new_with_provider(provider)),
                    Arc::new(EthersTransactionsContract::new(address, Arc::new(contract_client))),
                )
            }
        };

    info!(contract = ?address, rpc_url = %config.network.rpc_url, "Wallet bridge configured");
    Ok(TransactionBridge::new(wallet, contract, store, config.bridge.clone()))
}

/// Factory provider signing with `TXN_PRIVATE_KEY`, reading artifacts from
/// `artifacts` or the configured directory.
pub fn build_factory_provider(
    config: &AppConfig,
    artifacts: Option<PathBuf>,
) -> Result<ArtifactFactoryProvider<SignerMiddleware<Provider<Http>, LocalWallet>>> {
    let key = private_key_from_env()
        .with_context(|| format!("{} must be set to sign the deployment", PRIVATE_KEY_ENV))?;
    let provider = http_provider(&config.network.rpc_url)?;
    let signer = local_wallet(&key, config.network.chain_id)?;
    let client = Arc::new(SignerMiddleware::new(provider, signer));
    let dir = artifacts.unwrap_or_else(|| config.contract.artifacts_dir.clone());
    Ok(ArtifactFactoryProvider::new(dir, client))
}
