//! Deploys the Transactions contract and prints its address.
//! Exit status: 0 on success, 1 on any failure.
use clap::Parser;
use transactions_client::application::{build_factory_provider, init_logging};
use transactions_client::cli::DeployArgs;
use transactions_client::core::config::AppConfig;
use transactions_client::deploy;

#[tokio::main]
async fn main() {
    let args = DeployArgs::parse();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let provider = AppConfig::load(args.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|config| build_factory_provider(&config, args.artifacts.clone()));

    let code = match provider {
        Ok(provider) => {
            let mut stdout = std::io::stdout();
            let mut stderr = std::io::stderr();
            deploy::run(&provider, &args.contract, &mut stdout, &mut stderr).await
        }
        Err(e) => {
            eprintln!("{:#}", e);
            1
        }
    };

    std::process::exit(code);
}
