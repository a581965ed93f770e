//! Multisig wallet CLI application
//!
//! A command-line interface for operating a threshold multisig wallet.

use clap::{Args, Parser, Subcommand};
use multisig_executor::cli::{self, AppState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Threshold multisig wallet with off-chain signatures", long_about = None)]
struct Cli {
    /// Data directory for wallet storage
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Fields that make up a proposal
#[derive(Args)]
struct ProposalArgs {
    /// Destination address
    #[arg(long)]
    to: String,

    /// Value sent with the call
    #[arg(long, default_value = "0")]
    value: u64,

    /// Call data (hex)
    #[arg(long, default_value = "")]
    data: String,

    /// Unix timestamp after which the proposal expires
    #[arg(long)]
    deadline: u64,

    /// Nonce distinguishing otherwise identical proposals
    #[arg(long)]
    nonce: u64,
}

impl ProposalArgs {
    fn to_proposal(&self) -> cli::CliResult<multisig_executor::Proposal> {
        cli::parse_proposal(&self.to, self.value, &self.data, self.deadline, self.nonce)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new signer key
    Keygen,

    /// Initialize a new wallet
    Init {
        /// Signer address, in ascending order (repeat for each signer)
        #[arg(short, long = "signer", required = true)]
        signers: Vec<String>,

        /// Signatures required (M in M-of-N)
        #[arg(short, long)]
        threshold: u8,

        /// Hex salt for the wallet identity (random if omitted)
        #[arg(long)]
        salt: Option<String>,
    },

    /// Display wallet information
    Info,

    /// Credit an account in the ledger
    Fund {
        #[arg(short, long)]
        address: String,

        #[arg(short = 'n', long)]
        amount: u64,
    },

    /// Show an account balance
    Balance {
        #[arg(short, long)]
        address: String,
    },

    /// Print the transaction ID of a proposal
    TxId {
        #[command(flatten)]
        proposal: ProposalArgs,
    },

    /// Print the digest signers must sign
    Digest {
        #[command(flatten)]
        proposal: ProposalArgs,
    },

    /// Sign a proposal
    Sign {
        /// Signer private key (hex)
        #[arg(short, long)]
        key: String,

        #[command(flatten)]
        proposal: ProposalArgs,
    },

    /// Execute a proposal with collected signatures
    Execute {
        #[command(flatten)]
        proposal: ProposalArgs,

        /// Signature (hex), in ascending signer order; repeat for each
        #[arg(short, long = "signature", required = true)]
        signatures: Vec<String>,

        /// Claimed signer for each signature, in the same order
        #[arg(long = "signer")]
        signers: Vec<String>,
    },

    /// Show whether a transaction ID has been executed
    Status {
        #[arg(long)]
        tx_id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need a wallet
    match &cli.command {
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Init {
            signers,
            threshold,
            salt,
        } => {
            cli::cmd_init(&cli.data_dir, signers, *threshold, salt.as_deref())?;
            return Ok(());
        }
        Commands::TxId { proposal } => return cli::cmd_tx_id(&proposal.to_proposal()?),
        _ => {}
    }

    let mut state = AppState::load(cli.data_dir.clone())?;

    match cli.command {
        Commands::Keygen | Commands::Init { .. } | Commands::TxId { .. } => unreachable!(),

        Commands::Info => {
            cli::cmd_info(&state)?;
        }

        Commands::Fund { address, amount } => {
            cli::cmd_fund(&mut state, &address, amount)?;
        }

        Commands::Balance { address } => {
            cli::cmd_balance(&state, &address)?;
        }

        Commands::Digest { proposal } => {
            cli::cmd_digest(&state, &proposal.to_proposal()?)?;
        }

        Commands::Sign { key, proposal } => {
            cli::cmd_sign(&state, &key, &proposal.to_proposal()?)?;
        }

        Commands::Execute {
            proposal,
            signatures,
            signers,
        } => {
            cli::cmd_execute(&mut state, &proposal.to_proposal()?, &signatures, &signers)?;
        }

        Commands::Status { tx_id } => {
            cli::cmd_status(&state, &tx_id)?;
        }
    }

    Ok(())
}
