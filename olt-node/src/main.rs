use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use olt_crypto::{co_sign, sign_tx, sign_vote_as_authenticator, OltKeyPair, PartiallySignedVote};
use olt_governance::ProposalFilter;
use olt_node::{load_blocks, GenesisConfig, Node};
use olt_shared_types::transaction::UnsignedTx;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// OLT governance node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set logging level (trace, debug, info, warn, error). RUST_LOG overrides it.
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay recorded blocks and print the resulting proposals
    Run {
        #[arg(long)]
        genesis: PathBuf,
        #[arg(long)]
        blocks: PathBuf,
    },
    /// Print governance options as of a height after replaying blocks
    Options {
        #[arg(long)]
        genesis: PathBuf,
        #[arg(long)]
        blocks: Option<PathBuf>,
        /// Defaults to the last replayed height
        #[arg(long)]
        height: Option<u64>,
    },
    /// Write the development genesis
    Genesis {
        #[arg(long)]
        out: PathBuf,
    },
    /// Derive an address from a hex seed, or generate a new key
    Keygen {
        #[arg(long)]
        seed: Option<String>,
    },
    /// Sign a single-party transaction read from a JSON file
    Sign {
        #[arg(long)]
        seed: String,
        #[arg(long)]
        tx: PathBuf,
    },
    /// Sign a vote as the validator, producing the authenticator half
    SignVote {
        #[arg(long)]
        seed: String,
        #[arg(long)]
        tx: PathBuf,
    },
    /// Add the fee payer signature to a validator-signed vote
    CoSign {
        #[arg(long)]
        seed: String,
        #[arg(long)]
        partial: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Also forwards `log` records from the library crates.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn replayed_node(genesis: &Path, blocks: Option<&Path>) -> Result<Node> {
    let genesis = GenesisConfig::load(genesis)?;
    let mut node = Node::from_genesis(&genesis);
    if let Some(blocks) = blocks {
        let blocks = load_blocks(blocks)?;
        let report = node.replay(&blocks)?;
        info!(
            "Replayed {} blocks up to height {}: {} committed, {} rejected",
            report.blocks, report.final_height, report.committed_txs, report.rejected_txs
        );
    }
    Ok(node)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    match args.command {
        Command::Run { genesis, blocks } => {
            let node = replayed_node(&genesis, Some(&blocks))?;
            print_json(&node.queries().list_proposals(&ProposalFilter::default()))?;
        }
        Command::Options { genesis, blocks, height } => {
            let node = replayed_node(&genesis, blocks.as_deref())?;
            print_json(&node.queries().get_governance_options_for_height(height)?)?;
        }
        Command::Genesis { out } => {
            let genesis = GenesisConfig::default();
            fs::write(&out, genesis.to_toml_string()?)
                .with_context(|| format!("cannot write {}", out.display()))?;
            info!("Wrote development genesis to {}", out.display());
            for seed in olt_node::genesis::DEV_ACCOUNT_SEEDS {
                println!("account   seed {}", hex::encode([seed; 32]));
            }
            for seed in olt_node::genesis::DEV_VALIDATOR_SEEDS {
                println!("validator seed {}", hex::encode([seed; 32]));
            }
        }
        Command::Keygen { seed } => {
            let key = match seed {
                Some(seed) => OltKeyPair::from_seed_hex(&seed)?,
                None => OltKeyPair::generate(),
            };
            println!("seed       {}", hex::encode(key.seed()));
            println!("public key {}", hex::encode(key.public_key()));
            println!("address    {}", key.address());
        }
        Command::Sign { seed, tx } => {
            let key = OltKeyPair::from_seed_hex(&seed)?;
            let unsigned: UnsignedTx = read_json(&tx)?;
            print_json(&sign_tx(unsigned, &key)?)?;
        }
        Command::SignVote { seed, tx } => {
            let key = OltKeyPair::from_seed_hex(&seed)?;
            let unsigned: UnsignedTx = read_json(&tx)?;
            print_json(&sign_vote_as_authenticator(unsigned, &key)?)?;
        }
        Command::CoSign { seed, partial } => {
            let key = OltKeyPair::from_seed_hex(&seed)?;
            let partial: PartiallySignedVote = read_json(&partial)?;
            print_json(&co_sign(partial, &key)?)?;
        }
    }
    Ok(())
}
