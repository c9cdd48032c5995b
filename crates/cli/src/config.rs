//! Runtime configuration from flags and environment.

use anyhow::{Context, Result, bail};
use alloy::primitives::Address;
use clap::Args;
use custody_domain::Network;
use custody_execution::trade::TradeOrchestrator;
use custody_protocols::chain::{RpcConfig, RpcProvider};
use custody_protocols::custody::{CustodyApi, CustodyApiConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by every command. Flags override the environment.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Network name (e.g. mainnet, polygon, arbitrum)
    #[arg(long, global = true, env = "NETWORK", default_value = "polygon")]
    pub network: Network,

    /// RPC endpoint; defaults to the network's public endpoint
    #[arg(long, global = true, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Custody vault account that signs transactions
    #[arg(long, global = true, env = "VAULT_ACCOUNT_ID", default_value = "0")]
    pub vault_account_id: String,

    /// On-chain address of the vault account
    #[arg(long, global = true, env = "VAULT_ADDRESS")]
    pub vault_address: Option<Address>,

    /// Send to one-time addresses instead of whitelisted wallets
    #[arg(long, global = true, env = "TEST_MODE")]
    pub test_mode: bool,

    /// Actually send transactions; otherwise only simulate
    #[arg(long = "send", global = true, env = "SEND_ENABLED")]
    pub send_enabled: bool,

    /// Custody API key
    #[arg(long, global = true, env = "CUSTODY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the PEM private key used to sign custody requests
    #[arg(long, global = true, env = "CUSTODY_SECRET_KEY_PATH")]
    pub secret_key_path: Option<PathBuf>,

    /// Custody API base URL
    #[arg(
        long,
        global = true,
        env = "CUSTODY_BASE_URL",
        default_value = "https://api.fireblocks.io"
    )]
    pub base_url: String,
}

impl GlobalArgs {
    pub fn rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }

    pub fn chain(&self) -> Result<Arc<RpcProvider>> {
        let provider = RpcProvider::new(RpcConfig::new(self.rpc_url()))
            .with_context(|| format!("connecting to {}", self.rpc_url()))?;
        Ok(Arc::new(provider))
    }

    pub fn custody(&self) -> Result<Arc<CustodyApi>> {
        let Some(api_key) = self.api_key.clone() else {
            bail!("CUSTODY_API_KEY must be set in .env or environment");
        };
        let Some(path) = &self.secret_key_path else {
            bail!("CUSTODY_SECRET_KEY_PATH must be set in .env or environment");
        };
        let private_key_pem = std::fs::read_to_string(path)
            .with_context(|| format!("reading custody secret key {}", path.display()))?;

        let api = CustodyApi::new(CustodyApiConfig {
            base_url: self.base_url.clone(),
            api_key,
            private_key_pem,
            ..CustodyApiConfig::default()
        })
        .context("creating custody client")?;
        Ok(Arc::new(api))
    }

    pub fn vault_address(&self) -> Result<Address> {
        self.vault_address
            .context("VAULT_ADDRESS must be set in .env or environment")
    }

    pub fn orchestrator(&self) -> Result<TradeOrchestrator> {
        Ok(TradeOrchestrator::new(
            self.network,
            self.vault_account_id.clone(),
            self.test_mode,
            self.send_enabled,
            self.chain()?,
            self.custody()?,
        ))
    }
}
