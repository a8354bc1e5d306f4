//! `chain-dispatch` command.
//!
//! Submits one account batch to a registry contract and prints the
//! transaction hash. Prints nothing when the batch has no accounts for the
//! chain.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use chain_dispatch::blockchain::builder::parse_address;
use chain_dispatch::blockchain::signer::{TxSigner, PRIVATE_KEY_ENV_VAR};
use chain_dispatch::config::loader::load_config;
use chain_dispatch::config::validation::validate_config;
use chain_dispatch::observability::init_logging;
use chain_dispatch::{
    AccountBatch, ChainId, DispatchConfig, DispatchError, DispatchOutcome, Dispatcher,
    MetadataRegistry,
};

#[derive(Parser, Debug)]
#[command(
    name = "chain-dispatch",
    version,
    about = "Submit an account batch to a registry contract"
)]
struct Cli {
    /// Signing key, hex encoded.
    #[arg(long, env = PRIVATE_KEY_ENV_VAR, hide_env_values = true)]
    private_key: String,

    /// Target chain id.
    #[arg(long)]
    chain_id: u64,

    /// YAML batch file with per-chain account lists.
    #[arg(long)]
    batch_file: PathBuf,

    /// Root of the metadata repository. Overrides the config file.
    #[arg(long)]
    metadata_dir: Option<String>,

    /// Contract name in the registry.
    #[arg(long, default_value = "UxuyProtocol")]
    contract: String,

    /// Function receiving `(accounts, true)`.
    #[arg(long, default_value = "updateFOCAccounts")]
    function: String,

    /// Expected sender address; must match the key.
    #[arg(long)]
    sender: Option<String>,

    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 1. Configuration
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };
    if let Some(dir) = &cli.metadata_dir {
        config.registry.metadata_dir = dir.clone();
    }
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("config: {}", error);
        }
        return Err(format!("invalid configuration ({} errors)", errors.len()).into());
    }

    init_logging(&config.observability).map_err(|e| e.to_string())?;

    tracing::info!(
        chain_id = cli.chain_id,
        contract = %cli.contract,
        function = %cli.function,
        metadata_dir = %config.registry.metadata_dir,
        "chain-dispatch v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    // 2. Signing key
    let signer = TxSigner::from_private_key(&cli.private_key)?;
    if let Some(sender) = &cli.sender {
        let expected = parse_address(sender)?;
        if expected != signer.address() {
            return Err(DispatchError::InvalidTransactionParameters(format!(
                "--sender {} does not match the key's address {}",
                expected,
                signer.address()
            ))
            .into());
        }
    }

    // 3. Batch, before any network access
    let chain_id = ChainId(cli.chain_id);
    let batch = AccountBatch::load(&cli.batch_file, chain_id).await?;
    if batch.is_empty() {
        tracing::info!(chain_id = chain_id.0, "No accounts for chain, nothing to do");
        return Ok(());
    }

    // 4. Registry, then a dispatcher on an endpoint that serves the chain
    let registry = Arc::new(MetadataRegistry::load(&config.registry).await?);
    let dispatcher = Dispatcher::connect(chain_id, registry, signer, &config).await?;

    // 5. Submit
    match dispatcher
        .dispatch_account_batch(&cli.contract, &cli.function, batch)
        .await?
    {
        DispatchOutcome::Submitted(tx_hash) => println!("{}", tx_hash),
        DispatchOutcome::Empty => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_private_key_falls_back_to_env_var() {
        let command = Cli::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "private_key")
            .unwrap();
        assert_eq!(arg.get_env(), Some(std::ffi::OsStr::new(PRIVATE_KEY_ENV_VAR)));
        assert!(arg.is_hide_env_values_set());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from([
            "chain-dispatch",
            "--private-key",
            "0x01",
            "--chain-id",
            "56",
            "--batch-file",
            "batch.yaml",
        ])
        .unwrap();

        assert_eq!(cli.chain_id, 56);
        assert_eq!(cli.contract, "UxuyProtocol");
        assert_eq!(cli.function, "updateFOCAccounts");
        assert!(cli.sender.is_none());
    }
}
