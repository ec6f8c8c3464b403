// src/main.rs
//! Transactions client entry point.
//! Wires the wallet bridge from configuration and runs one command.
use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use transactions_client::application::{build_bridge, init_logging};
use transactions_client::cli::{Cli, Commands};
use transactions_client::core::config::AppConfig;
use transactions_client::core::FormField;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;
    info!("Starting transactions-client v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(cli.config.as_deref())?;
    let bridge = build_bridge(&config).await?;

    // startup failures are reported but do not block the command
    if let Err(e) = bridge.initialize().await {
        warn!(kind = e.kind(), error = %e, "Startup sync incomplete");
    }

    match cli.command {
        Commands::Connect => match bridge.connect().await? {
            Some(account) => println!("Connected: {}", account),
            None => println!("No account connected"),
        },
        Commands::Status => {
            println!("{}", serde_json::to_string_pretty(&bridge.state())?);
        }
        Commands::History => {
            let records = bridge.refresh_transaction_history().await?;
            if records.is_empty() {
                println!("No transactions recorded");
            }
            for r in records {
                println!(
                    "{}  {} -> {}  {} ETH  [{}] {}",
                    r.timestamp, r.address_from, r.address_to, r.amount, r.keyword, r.message
                );
            }
        }
        Commands::Count => {
            let count = bridge.prime_transaction_count_cache().await?;
            println!("{}", count);
        }
        Commands::Send { to, amount, keyword, message } => {
            if bridge.current_account().is_none() {
                bridge.connect().await?;
            }
            bridge.update_form_field(FormField::AddressTo, to);
            bridge.update_form_field(FormField::Amount, amount);
            bridge.update_form_field(FormField::Keyword, keyword);
            bridge.update_form_field(FormField::Message, message);

            match bridge.submit_transaction().await? {
                Some(tx_hash) => {
                    println!("Recorded in transaction {:?}", tx_hash);
                    if let Some(count) = bridge.transaction_count() {
                        println!("Transaction count: {}", count);
                    }
                }
                None => println!("No wallet available"),
            }
        }
    }

    Ok(())
}
