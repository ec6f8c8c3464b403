//! One-shot contract deployment.
//!
//! A [`ContractFactoryProvider`] hands out a factory for a named contract;
//! [`deploy`] sends the creation transaction, waits for it to be mined and
//! prints the address. [`run`] turns the outcome into a process exit code.

use async_trait::async_trait;
use ethers::{
    abi::Abi,
    contract::ContractFactory,
    providers::Middleware,
    types::{Address, Bytes},
    utils::to_checksum,
};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("No artifact for contract '{name}' under {}", .dir.display())]
    ArtifactNotFound { name: String, dir: PathBuf },

    #[error("Invalid artifact {}: {source}", .path.display())]
    InvalidArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Artifact for '{0}' has no deployable bytecode")]
    MissingBytecode(String),

    #[error("Deployment failed: {0}")]
    Deployment(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Source of contract factories, looked up by contract name.
#[async_trait]
pub trait ContractFactoryProvider: Send + Sync {
    async fn get_contract_factory(&self, name: &str)
        -> Result<Box<dyn DeployableContract>, DeployError>;
}

/// A contract ready to be created on chain.
#[async_trait]
pub trait DeployableContract: Send + Sync {
    /// Sends the creation transaction and resolves with the address once mined.
    async fn deploy(&self) -> Result<Address, DeployError>;
}

/// Deploys `contract_name` and prints `"<name> deployed to: <address>"` to `out`.
pub async fn deploy<W: Write>(
    provider: &dyn ContractFactoryProvider,
    contract_name: &str,
    out: &mut W,
) -> Result<Address, DeployError> {
    let factory = provider.get_contract_factory(contract_name).await?;
    info!(contract = contract_name, "Submitting contract creation transaction");
    let address = factory.deploy().await?;
    writeln!(out, "{} deployed to: {}", contract_name, to_checksum(&address, None))?;
    Ok(address)
}

/// Runs [`deploy`] once. Returns 0 on success; on failure writes the error
/// message to `err`, prints no address and returns 1.
pub async fn run<O: Write, E: Write>(
    provider: &dyn ContractFactoryProvider,
    contract_name: &str,
    out: &mut O,
    err: &mut E,
) -> i32 {
    match deploy(provider, contract_name, out).await {
        Ok(address) => {
            info!(contract = contract_name, address = ?address, "Deployment confirmed");
            0
        }
        Err(e) => {
            error!(contract = contract_name, error = %e, "Deployment failed");
            let _ = writeln!(err, "{}", e);
            1
        }
    }
}

/// Compiled artifact as written by Hardhat (`abi` + creation `bytecode`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    #[serde(default)]
    pub contract_name: Option<String>,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn from_file(path: &Path) -> Result<Self, DeployError> {
        let content = std::fs::read(path)?;
        serde_json::from_slice(&content)
            .map_err(|source| DeployError::InvalidArtifact { path: path.to_path_buf(), source })
    }
}

/// Locates `<dir>/<Name>.sol/<Name>.json`, falling back to `<dir>/<Name>.json`.
pub fn find_artifact(artifacts_dir: &Path, name: &str) -> Result<PathBuf, DeployError> {
    let candidates = [
        artifacts_dir.join(format!("{name}.sol")).join(format!("{name}.json")),
        artifacts_dir.join(format!("{name}.json")),
    ];
    candidates.into_iter().find(|p| p.is_file()).ok_or_else(|| DeployError::ArtifactNotFound {
        name: name.to_string(),
        dir: artifacts_dir.to_path_buf(),
    })
}

/// Factory provider reading compiled artifacts from disk and deploying
/// through an ethers middleware (normally a `SignerMiddleware`).
pub struct ArtifactFactoryProvider<M> {
    artifacts_dir: PathBuf,
    client: Arc<M>,
}

impl<M: Middleware + 'static> ArtifactFactoryProvider<M> {
    pub fn new(artifacts_dir: impl Into<PathBuf>, client: Arc<M>) -> Self {
        Self { artifacts_dir: artifacts_dir.into(), client }
    }
}

#[async_trait]
impl<M: Middleware + 'static> ContractFactoryProvider for ArtifactFactoryProvider<M> {
    async fn get_contract_factory(
        &self,
        name: &str,
    ) -> Result<Box<dyn DeployableContract>, DeployError> {
        let path = find_artifact(&self.artifacts_dir, name)?;
        let artifact = ContractArtifact::from_file(&path)?;
        if artifact.bytecode.is_empty() {
            return Err(DeployError::MissingBytecode(name.to_string()));
        }
        debug!(
            path = %path.display(),
            artifact = artifact.contract_name.as_deref().unwrap_or(name),
            bytecode_len = artifact.bytecode.len(),
            "Loaded contract artifact"
        );
        Ok(Box::new(EthersDeployable {
            abi: artifact.abi,
            bytecode: artifact.bytecode,
            client: self.client.clone(),
        }))
    }
}

struct EthersDeployable<M> {
    abi: Abi,
    bytecode: Bytes,
    client: Arc<M>,
}

#[async_trait]
impl<M: Middleware + 'static> DeployableContract for EthersDeployable<M> {
    async fn deploy(&self) -> Result<Address, DeployError> {
        let factory = ContractFactory::new(self.abi.clone(), self.bytecode.clone(), self.client.clone());
        let deployer = factory.deploy(()).map_err(|e| DeployError::Deployment(e.to_string()))?;
        let contract = deployer.send().await.map_err(|e| DeployError::Deployment(e.to_string()))?;
        Ok(contract.address())
    }
}
