//! CLI commands for the multisig wallet
//!
//! Implements all command handlers for the CLI interface.

use crate::contract::AccountLedger;
use crate::core::{Address, Proposal, TransactionId};
use crate::crypto::{eth_signed_message_hash, KeyPair};
use crate::multisig::{
    ProposalExecutor, Secp256k1Scheme, SignatureBundle, SignerRegistry, SystemClock, WalletState,
};
use crate::storage::{Storage, StorageConfig, StoredWallet};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub storage: Storage,
    pub stored: StoredWallet,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load an initialized wallet
    pub fn load(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(storage_config(&data_dir))?;

        if !storage.exists() {
            return Err(format!(
                "no wallet found in {:?}; run `multisig init` first",
                data_dir
            )
            .into());
        }

        let stored = storage.load()?;
        log::debug!("Loaded wallet {}", stored.wallet.identity);

        Ok(Self {
            storage,
            stored,
            data_dir,
        })
    }

    /// Executor over the loaded state
    pub fn executor(&self) -> ProposalExecutor {
        ProposalExecutor::from_state(
            self.stored.wallet.clone(),
            Secp256k1Scheme::new(),
            SystemClock,
        )
    }

    /// Save the current state
    pub fn save(&mut self) -> CliResult<()> {
        self.stored.updated_at = Utc::now();
        self.storage.save(&self.stored)?;
        Ok(())
    }
}

fn storage_config(data_dir: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Parse an identity argument
pub fn parse_address(text: &str) -> CliResult<Address> {
    text.parse::<Address>()
        .map_err(|e| format!("invalid address {:?}: {}", text, e).into())
}

/// Parse hex call data or signatures (optional `0x`, empty allowed)
pub fn parse_hex_bytes(text: &str) -> CliResult<Vec<u8>> {
    let trimmed = text.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(stripped).map_err(|e| format!("invalid hex {:?}: {}", text, e).into())
}

/// Build a proposal from command-line fields
pub fn parse_proposal(
    to: &str,
    value: u64,
    data: &str,
    deadline: u64,
    nonce: u64,
) -> CliResult<Proposal> {
    Ok(Proposal::new(
        parse_address(to)?,
        value,
        parse_hex_bytes(data)?,
        deadline,
        nonce,
    ))
}

/// Generate a new signer key
pub fn cmd_keygen() -> CliResult<()> {
    let key = KeyPair::generate();

    println!("🔐 New signer key generated!");
    println!("   📍 Identity:    {}", key.address());
    println!("   🔑 Public Key:  {}", key.public_key_hex());
    println!("   🗝️  Private Key: {}", key.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: Store the private key offline. It is not saved anywhere.");

    Ok(())
}

/// Initialize a new wallet
pub fn cmd_init(
    data_dir: &Path,
    signers: &[String],
    threshold: u8,
    salt: Option<&str>,
) -> CliResult<Address> {
    let storage = Storage::new(storage_config(data_dir))?;

    if storage.exists() {
        let existing = storage.load()?;
        println!("⚠️  Wallet already exists at {:?}", data_dir);
        println!("   Identity: {}", existing.wallet.identity);
        return Ok(existing.wallet.identity);
    }

    let signers = signers
        .iter()
        .map(|s| parse_address(s))
        .collect::<CliResult<Vec<_>>>()?;
    let registry = SignerRegistry::new(signers, threshold)?;

    let salt = match salt {
        Some(text) => parse_hex_bytes(text)?,
        None => rand::random::<[u8; 32]>().to_vec(),
    };
    let identity = registry.derive_wallet_identity(&salt);

    println!("✅ Multisig wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   📍 Identity: {}", identity);
    println!("   🧂 Salt: 0x{}", hex::encode(&salt));
    println!("   🔏 Policy: {}", registry.description());

    let executor = ProposalExecutor::with_defaults(identity, registry);
    storage.save(&StoredWallet::new(executor.state(), AccountLedger::new()))?;

    Ok(identity)
}

/// Display wallet info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let WalletState {
        identity,
        registry,
        ledger,
    } = &state.stored.wallet;

    println!("🔏 Multisig Wallet");
    println!("   ├─ Identity: {}", identity);
    println!("   ├─ Policy: {}", registry.description());
    println!("   ├─ Balance: {}", state.stored.accounts.balance(identity));
    println!("   ├─ Executed proposals: {}", ledger.len());
    println!("   └─ Signers (canonical order):");
    for signer in registry.signers() {
        println!("      └─ {}", signer);
    }

    Ok(())
}

/// Credit an account
pub fn cmd_fund(state: &mut AppState, address: &str, amount: u64) -> CliResult<()> {
    let account = parse_address(address)?;
    let balance = state.stored.accounts.deposit(account, amount)?;
    state.save()?;

    println!("💰 Credited {} to {}", amount, account);
    println!("   New balance: {}", balance);
    Ok(())
}

/// Show an account balance
pub fn cmd_balance(state: &AppState, address: &str) -> CliResult<()> {
    let account = parse_address(address)?;
    println!(
        "💰 Balance for {}: {}",
        account,
        state.stored.accounts.balance(&account)
    );
    Ok(())
}

/// Print the deterministic identifier of a proposal
pub fn cmd_tx_id(proposal: &Proposal) -> CliResult<()> {
    println!("{}", proposal.transaction_id());
    Ok(())
}

/// Print everything a signer needs to reproduce
pub fn cmd_digest(state: &AppState, proposal: &Proposal) -> CliResult<()> {
    let executor = state.executor();
    let digest = executor.digest(proposal);

    println!("📝 Proposal for wallet {}", executor.identity());
    println!("   ├─ Transaction ID: {}", proposal.transaction_id());
    println!("   ├─ Digest:         0x{}", hex::encode(digest));
    println!(
        "   └─ Signing hash:   0x{}",
        hex::encode(eth_signed_message_hash(&digest))
    );
    Ok(())
}

/// Sign a proposal with a private key
pub fn cmd_sign(state: &AppState, key_hex: &str, proposal: &Proposal) -> CliResult<String> {
    let key = KeyPair::from_private_key_hex(key_hex)?;
    let executor = state.executor();

    if !executor.registry().is_signer(&key.address()) {
        println!(
            "⚠️  {} is not a signer of this wallet; the signature will be rejected",
            key.address()
        );
    }

    let signature = format!("0x{}", hex::encode(key.sign_digest(&executor.digest(proposal))?));
    println!("✍️  Signature by {}:", key.address());
    println!("{}", signature);
    Ok(signature)
}

/// Authorize and execute a proposal
pub fn cmd_execute(
    state: &mut AppState,
    proposal: &Proposal,
    signatures: &[String],
    signers: &[String],
) -> CliResult<bool> {
    let signatures = signatures
        .iter()
        .map(|s| parse_hex_bytes(s))
        .collect::<CliResult<Vec<_>>>()?;

    let bundle = if signers.is_empty() {
        SignatureBundle::new(signatures)
    } else {
        let signers = signers
            .iter()
            .map(|s| parse_address(s))
            .collect::<CliResult<Vec<_>>>()?;
        SignatureBundle::with_signers(signatures, signers)
    };

    let mut executor = state.executor();
    let outcome = executor.execute_transaction(proposal, &bundle, &mut state.stored.accounts)?;

    state.stored.wallet = executor.state();
    state.save()?;

    println!("📤 Proposal executed");
    println!("   ├─ Transaction ID: {}", outcome.transaction_id);
    if outcome.success {
        println!("   └─ Result: ✅ success");
        if !outcome.return_data.is_empty() {
            println!("      Return data: 0x{}", hex::encode(&outcome.return_data));
        }
    } else {
        println!(
            "   └─ Result: ❌ call failed ({})",
            outcome.failure.as_deref().unwrap_or("unknown")
        );
        println!("      The proposal is consumed. Submit a new nonce to try again.");
    }

    Ok(outcome.success)
}

/// Show the replay ledger entry for a transaction ID
pub fn cmd_status(state: &AppState, tx_id: &str) -> CliResult<()> {
    let tx_id: TransactionId = tx_id
        .parse()
        .map_err(|e| format!("invalid transaction id {:?}: {}", tx_id, e))?;

    match state.stored.wallet.ledger.get(&tx_id) {
        Some(record) => {
            println!("🔍 {} executed", tx_id);
            println!("   ├─ Success: {}", record.success);
            println!("   └─ Executed at: {}", record.executed_at);
        }
        None => println!("🔍 {} has not been executed", tx_id),
    }
    Ok(())
}
