//! Command line interface for custody-gated execution.
mod config;

use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::Filter;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::GlobalArgs;
use custody_domain::{CallDescriptor, SubmissionId};
use custody_execution::custody::WhitelistResolver;
use custody_execution::trade::ApprovalResult;
use custody_protocols::capabilities::SwapParams;
use custody_protocols::chain::ChainClient;
use custody_protocols::erc20;
use custody_protocols::events::{EventReader, EventReaderConfig};
use custody_protocols::uniswap_v2::UniswapV2Router;
use dotenv::dotenv;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "custody")]
#[command(about = "Custody-gated transaction execution for EVM DeFi strategies", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Venue {
    Uniswap,
    Quickswap,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a token balance
    Balance {
        /// Token contract
        #[arg(long)]
        token: Address,

        /// Holder; defaults to the vault address
        #[arg(long)]
        owner: Option<Address>,
    },
    /// Show an allowance
    Allowance {
        #[arg(long)]
        token: Address,

        #[arg(long)]
        spender: Address,

        /// Owner; defaults to the vault address
        #[arg(long)]
        owner: Option<Address>,
    },
    /// Make sure a spender may pull an amount of a token
    Approve {
        #[arg(long)]
        token: Address,

        #[arg(long)]
        spender: Address,

        /// Required amount in base units
        #[arg(long)]
        amount: U256,
    },
    /// Simulate and, with --send, submit a raw contract call
    Send {
        /// Contract to call
        #[arg(long)]
        to: Address,

        /// Hex-encoded call data
        #[arg(long)]
        data: Bytes,

        /// Native value in wei
        #[arg(long, default_value = "0")]
        value: U256,

        /// Check the whitelist against this address instead of --to
        #[arg(long)]
        whitelist_as: Option<Address>,
    },
    /// Swap exact input tokens on a V2 router
    Swap {
        #[arg(long, value_enum, default_value = "quickswap")]
        venue: Venue,

        /// Token route, comma separated, input first
        #[arg(long, value_delimiter = ',', required = true)]
        path: Vec<Address>,

        #[arg(long)]
        amount_in: U256,

        #[arg(long, default_value = "0")]
        min_amount_out: U256,

        /// Seconds until the swap expires
        #[arg(long, default_value_t = 600)]
        deadline_secs: u64,
    },
    /// Show the custody status of a transaction
    Status {
        /// Custody transaction id
        #[arg(long)]
        id: String,

        /// Poll until the transaction reaches a terminal outcome
        #[arg(long)]
        wait: bool,
    },
    /// Resolve an address against the custody whitelist
    Whitelist {
        #[arg(long)]
        address: Address,
    },
    /// Count logs emitted by a contract over a block range
    Events {
        #[arg(long)]
        address: Address,

        /// Event signature, e.g. "Transfer(address,address,uint256)"
        #[arg(long)]
        event: Option<String>,

        #[arg(long)]
        from_block: u64,

        /// Defaults to the latest block
        #[arg(long)]
        to_block: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let global = &cli.global;
    info!(
        network = %global.network,
        test_mode = global.test_mode,
        send_enabled = global.send_enabled,
        "Custody CLI"
    );

    match cli.command {
        Commands::Balance { token, owner } => {
            let owner = match owner {
                Some(owner) => owner,
                None => global.vault_address()?,
            };
            let chain = global.chain()?;
            let metadata = erc20::read_token(chain.as_ref(), token).await?;
            let raw = erc20::read_balance(chain.as_ref(), token, owner).await?;

            println!(
                "{} {} ({} raw) held by {}",
                metadata.amount(raw),
                metadata.symbol,
                raw,
                owner
            );
        }
        Commands::Allowance {
            token,
            spender,
            owner,
        } => {
            let owner = match owner {
                Some(owner) => owner,
                None => global.vault_address()?,
            };
            let chain = global.chain()?;
            let allowance = erc20::read_allowance(chain.as_ref(), token, owner, spender).await?;
            println!("Allowance of {spender} on {token} for {owner}: {allowance}");
        }
        Commands::Approve {
            token,
            spender,
            amount,
        } => {
            let owner = global.vault_address()?;
            let orchestrator = global.orchestrator()?;
            match orchestrator
                .ensure_approval(owner, token, spender, amount)
                .await?
            {
                ApprovalResult::AlreadyApproved => println!("✅ Allowance already sufficient"),
                ApprovalResult::Submitted(outcome) => println!("Approval {outcome}"),
            }
        }
        Commands::Send {
            to,
            data,
            value,
            whitelist_as,
        } => {
            let from = global.vault_address()?;
            let orchestrator = global.orchestrator()?;
            let call = CallDescriptor::new(to, data, from).with_value(value);

            let report = orchestrator.send(call, None, whitelist_as).await?;
            println!("Simulation: {}", report.simulation);
            match (report.submission, report.outcome) {
                (Some(submission), Some(outcome)) => {
                    println!("Custody transaction {}: {outcome}", submission.id);
                }
                _ => println!("Not sent (pass --send or set SEND_ENABLED=true)"),
            }
        }
        Commands::Swap {
            venue,
            path,
            amount_in,
            min_amount_out,
            deadline_secs,
        } => {
            let from = global.vault_address()?;
            let orchestrator = global.orchestrator()?;
            let router = match venue {
                Venue::Uniswap => UniswapV2Router::uniswap(),
                Venue::Quickswap => UniswapV2Router::quickswap(),
            };
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
            let params = SwapParams {
                amount_in,
                min_amount_out,
                path,
                recipient: from,
                deadline: now + deadline_secs,
            };

            let report = orchestrator.execute_swap(&router, from, &params).await?;
            match report.outcome {
                Some(outcome) => println!("Swap {outcome}"),
                None => println!("Swap simulated: {}", report.simulation),
            }
        }
        Commands::Status { id, wait } => {
            let orchestrator = global.orchestrator()?;
            let id = SubmissionId::new(id);

            if wait {
                let outcome = orchestrator.bridge().poll(&id).await?;
                println!("{id}: {outcome}");
            } else {
                let report = orchestrator.bridge().status(&id).await?;
                println!(
                    "{}: {} (sub-status: {}, hash: {})",
                    report.id,
                    report.status,
                    report.sub_status.as_deref().unwrap_or("-"),
                    report
                        .tx_hash
                        .map(|h| h.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        Commands::Whitelist { address } => {
            let resolver = WhitelistResolver::new(global.custody()?);
            let destination = resolver
                .resolve(address, global.network.asset_id())
                .await?;
            println!("✅ {address} resolves to {destination}");
        }
        Commands::Events {
            address,
            event,
            from_block,
            to_block,
        } => {
            let chain = global.chain()?;
            let to_block = match to_block {
                Some(block) => block,
                None => chain.block_number().await.context("reading latest block")?,
            };

            let mut filter = Filter::new().address(address);
            if let Some(signature) = event.as_deref() {
                filter = filter.event(signature);
            }

            println!("📡 Reading logs of {address} from {from_block} to {to_block}...");
            let reader = EventReader::new(chain, EventReaderConfig::for_network(global.network));
            let logs = reader.read_logs(&filter, from_block, to_block).await?;

            println!("Found {} logs", logs.len());
            for log in logs.iter().take(20) {
                println!(
                    "  block {:<10} tx {}",
                    log.block_number.unwrap_or_default(),
                    log.transaction_hash
                        .map(|h| h.to_string())
                        .unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
