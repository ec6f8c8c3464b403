use async_trait::async_trait;
use ethers::{
    contract::{abigen, ContractError},
    middleware::SignerMiddleware,
    providers::{
        Http, JsonRpcClient, Middleware, MiddlewareError, PendingTransaction, Provider,
        ProviderError, RpcError,
    },
    signers::{LocalWallet, Signer},
    types::{Address, TransactionRequest, H256, U256, U64},
    utils::to_checksum,
};
use serde_json::{json, Value};
use std::{str::FromStr, sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use super::traits::{methods, TransactionsContract, WalletClient};
use crate::core::{BridgeError, RawTransaction};

abigen!(Transactions, "$CARGO_MANIFEST_DIR/abi/Transactions.json");

/// Builds an HTTP provider with a request timeout. Honors HTTPS_PROXY / HTTP_PROXY.
pub fn http_provider(rpc_url: &str) -> Result<Provider<Http>, BridgeError> {
    let rpc_url_clean = rpc_url.trim();
    let parsed_url = reqwest::Url::parse(rpc_url_clean).map_err(|e| {
        BridgeError::InvalidInput(format!(
            "Invalid RPC URL '{}': {}. Please check config.toml or env vars.",
            rpc_url_clean, e
        ))
    })?;

    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(30));
    if let Ok(proxy) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("HTTP_PROXY")) {
        if let Ok(p) = reqwest::Proxy::all(proxy) {
            builder = builder.proxy(p);
        }
    }
    let client = builder
        .build()
        .map_err(|e| BridgeError::network_with_source("Failed to build HTTP client", e))?;

    debug!(url = %parsed_url, "HTTP provider ready");
    Ok(Provider::new(Http::new_with_client(parsed_url, client)))
}

/// Parses a hex private key into a signer bound to `chain_id`. The key is never logged.
pub fn local_wallet(private_key: &str, chain_id: u64) -> Result<LocalWallet, BridgeError> {
    let wallet = LocalWallet::from_str(private_key.trim())
        .map_err(|e| BridgeError::InvalidInput(format!("Invalid private key: {}", e)))?;
    Ok(wallet.with_chain_id(chain_id))
}

pub(crate) fn map_provider_error(err: ProviderError) -> BridgeError {
    if let Some(resp) = RpcError::as_error_response(&err) {
        return BridgeError::from_rpc_error(resp.code, &resp.message);
    }
    BridgeError::network_with_source("Provider request failed", err)
}

pub(crate) fn map_middleware_error<E>(err: E) -> BridgeError
where
    E: MiddlewareError + 'static,
{
    if let Some(resp) = err.as_error_response() {
        return BridgeError::from_rpc_error(resp.code, &resp.message);
    }
    BridgeError::network_with_source("Wallet request failed", err)
}

pub(crate) fn map_contract_error<M: Middleware + 'static>(err: ContractError<M>) -> BridgeError {
    let response = match &err {
        ContractError::Revert(_) => return BridgeError::ContractReverted(err.to_string()),
        ContractError::MiddlewareError { e } => {
            e.as_error_response().map(|r| (r.code, r.message.clone()))
        }
        ContractError::ProviderError { e } => {
            RpcError::as_error_response(e).map(|r| (r.code, r.message.clone()))
        }
        _ => None,
    };
    match response {
        Some((code, message)) => BridgeError::from_rpc_error(code, &message),
        None => BridgeError::network_with_source("Contract call failed", err),
    }
}

/// Wallet backed by a JSON-RPC node that manages its own accounts
/// (e.g. a local development node). Requests are passed through verbatim.
#[derive(Clone, Debug)]
pub struct RpcWallet<P: JsonRpcClient = Http> {
    provider: Provider<P>,
}

impl RpcWallet<Http> {
    pub fn connect(rpc_url: &str) -> Result<Self, BridgeError> {
        info!(rpc_url = %rpc_url.trim(), "Using node-managed accounts");
        Ok(Self { provider: http_provider(rpc_url)? })
    }
}

impl<P: JsonRpcClient> RpcWallet<P> {
    pub fn new_with_provider(provider: Provider<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> WalletClient for RpcWallet<P>
where
    P: JsonRpcClient + 'static,
{
    fn is_present(&self) -> bool {
        true
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        debug!(method, "Forwarding wallet request to node");
        self.provider.request::<_, Value>(method, params).await.map_err(map_provider_error)
    }
}

/// Wallet holding a local private key. Account queries answer with the key's
/// address; `eth_sendTransaction` is signed locally and broadcast.
#[derive(Debug)]
pub struct SignerWallet<P: JsonRpcClient = Http> {
    client: SignerMiddleware<Provider<P>, LocalWallet>,
}

impl SignerWallet<Http> {
    pub fn connect(rpc_url: &str, private_key: &str, chain_id: u64) -> Result<Self, BridgeError> {
        let provider = http_provider(rpc_url)?;
        let wallet = local_wallet(private_key, chain_id)?;
        info!(address = %to_checksum(&wallet.address(), None), chain_id, "Using local signer");
        Ok(Self::new(provider, wallet))
    }
}

impl<P: JsonRpcClient + 'static> SignerWallet<P> {
    pub fn new(provider: Provider<P>, wallet: LocalWallet) -> Self {
        Self { client: SignerMiddleware::new(provider, wallet) }
    }

    pub fn address(&self) -> Address {
        self.client.address()
    }

    async fn send_transaction(&self, params: Value) -> Result<Value, BridgeError> {
        let mut requests: Vec<TransactionRequest> = serde_json::from_value(params)
            .map_err(|e| BridgeError::InvalidInput(format!("Malformed transaction request: {}", e)))?;
        if requests.is_empty() {
            return Err(BridgeError::InvalidInput("eth_sendTransaction without params".into()));
        }
        let tx = requests.swap_remove(0);

        let pending =
            self.client.send_transaction(tx, None).await.map_err(map_middleware_error)?;
        let tx_hash = pending.tx_hash();
        info!(tx_hash = ?tx_hash, "Transaction sent");
        Ok(json!(format!("{:?}", tx_hash)))
    }
}

#[async_trait]
impl<P> WalletClient for SignerWallet<P>
where
    P: JsonRpcClient + 'static,
{
    fn is_present(&self) -> bool {
        true
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        match method {
            methods::ETH_ACCOUNTS | methods::ETH_REQUEST_ACCOUNTS => {
                Ok(json!([to_checksum(&self.address(), None)]))
            }
            methods::ETH_SEND_TRANSACTION => self.send_transaction(params).await,
            _ => self
                .client
                .provider()
                .request::<_, Value>(method, params)
                .await
                .map_err(map_provider_error),
        }
    }
}

/// `Transactions` contract bound through ethers abigen bindings.
pub struct EthersTransactionsContract<M> {
    contract: Transactions<M>,
    client: Arc<M>,
}

impl<M: Middleware + 'static> EthersTransactionsContract<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self { contract: Transactions::new(address, client.clone()), client }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }
}

#[async_trait]
impl<M: Middleware + 'static> TransactionsContract for EthersTransactionsContract<M> {
    async fn get_all_transactions(&self) -> Result<Vec<RawTransaction>, BridgeError> {
        let transfers =
            self.contract.get_all_transactions().call().await.map_err(map_contract_error)?;
        debug!(count = transfers.len(), "getAllTransactions returned");

        Ok(transfers
            .into_iter()
            .map(|t| RawTransaction {
                sender: to_checksum(&t.sender, None),
                receiver: to_checksum(&t.receiver, None),
                amount: t.amount,
                message: t.message,
                timestamp: t.timestamp,
                keyword: t.keyword,
            })
            .collect())
    }

    async fn add_to_blockchain(
        &self,
        address_to: &str,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> Result<H256, BridgeError> {
        let receiver = Address::from_str(address_to.trim()).map_err(|e| {
            BridgeError::InvalidInput(format!("Invalid recipient address '{}': {}", address_to, e))
        })?;

        let call = self.contract.add_to_blockchain(
            receiver,
            amount,
            message.to_string(),
            keyword.to_string(),
        );
        let pending = call.send().await.map_err(map_contract_error)?;
        let tx_hash = pending.tx_hash();
        info!(tx_hash = ?tx_hash, "addToBlockchain submitted");
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: H256) -> Result<(), BridgeError> {
        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .await
            .map_err(map_provider_error)?;

        match receipt {
            None => {
                warn!(tx_hash = ?tx_hash, "Transaction dropped before confirmation");
                Err(BridgeError::network(format!("Transaction {:?} was dropped", tx_hash)))
            }
            Some(r) if r.status == Some(U64::zero()) => {
                Err(BridgeError::ContractReverted(format!("Transaction {:?} reverted", tx_hash)))
            }
            Some(r) => {
                debug!(tx_hash = ?tx_hash, block = ?r.block_number, "Transaction confirmed");
                Ok(())
            }
        }
    }

    async fn get_transaction_count(&self) -> Result<U256, BridgeError> {
        self.contract.get_transaction_count().call().await.map_err(map_contract_error)
    }
}
