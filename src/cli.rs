use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Transactions contract client (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "transactions-client", about = "Send and list recorded transfers", version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Request account access from the wallet
    Connect,
    /// Print the bridge state as JSON
    Status,
    /// List every recorded transfer
    History,
    /// Print the on-chain transaction count and cache it
    Count,
    /// Transfer value and record it in the contract
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        keyword: String,
        #[arg(long, default_value = "")]
        message: String,
    },
}

/// Arguments of the `deploy` binary.
#[derive(Debug, Parser)]
#[command(name = "deploy", about = "Deploy the Transactions contract", version)]
pub struct DeployArgs {
    /// Path to the TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Contract name to look up in the artifacts directory
    #[arg(long, default_value = "Transactions")]
    pub contract: String,

    /// Overrides `contract.artifacts_dir`
    #[arg(long)]
    pub artifacts: Option<PathBuf>,
}
