//! multisig: command-line front end for a multi-signature wallet ledger.
//!
//! Wallet state lives in a snapshot file. Every mutating command loads it,
//! applies one ledger operation, prints the events that operation emitted,
//! and writes the snapshot back only if the operation succeeded.

mod journal;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use multisig_ledger::{
    LedgerError, LedgerEvent, LedgerSnapshot, MultisigLedger, Transaction, WalletConfig,
};
use multisig_types::{AccountId, Amount, TxIndex};
use multisig_utils::{init_logging, LogFormat};

use crate::journal::{read_journal, JournalTransfer};

const DEFAULT_STATE_FILE: &str = "./multisig.state";

type Ledger = MultisigLedger<JournalTransfer>;

#[derive(Parser)]
#[command(name = "multisig", about = "Multi-signature wallet ledger")]
struct Cli {
    /// Wallet snapshot file. For `init`, defaults to the config's `state_file`.
    #[arg(long, global = true, env = "MULTISIG_STATE")]
    state: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "MULTISIG_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "MULTISIG_LOG_LEVEL")]
    log_level: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create a wallet from a TOML configuration file.
    Init {
        /// Path to the wallet configuration.
        #[arg(long)]
        config: PathBuf,

        /// Overwrite an existing snapshot.
        #[arg(long)]
        force: bool,
    },
    /// Pay value into the wallet.
    Deposit {
        #[arg(long)]
        from: AccountId,
        #[arg(long)]
        amount: u128,
    },
    /// Propose an outbound transfer (counts as the caller's confirmation).
    Propose {
        #[arg(long)]
        caller: AccountId,
        #[arg(long)]
        to: AccountId,
        #[arg(long)]
        value: u128,
        /// Hex call data, optionally `0x`-prefixed.
        #[arg(long)]
        data: Option<String>,
    },
    /// Approve a pending transaction.
    Confirm {
        #[arg(long)]
        caller: AccountId,
        #[arg(long)]
        index: TxIndex,
    },
    /// Vote against a pending transaction.
    Reject {
        #[arg(long)]
        caller: AccountId,
        #[arg(long)]
        index: TxIndex,
    },
    /// Show the wallet summary or a single transaction.
    Show {
        #[arg(long)]
        index: Option<TxIndex>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List the owners and the confirmation threshold.
    Owners,
    /// List payouts released to the journal.
    Payouts,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.command {
        Command::Init { config, .. } => Some(
            WalletConfig::from_toml_file(&config.to_string_lossy())
                .with_context(|| format!("loading {}", config.display()))?,
        ),
        _ => None,
    };

    let log_format = cli
        .log_format
        .clone()
        .or_else(|| config.as_ref().map(|c| c.log_format.clone()))
        .unwrap_or_else(|| "human".to_string());
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    init_logging(log_format.parse::<LogFormat>()?, &log_level);

    let state = cli
        .state
        .clone()
        .or_else(|| config.as_ref().map(|c| c.state_file.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

    match cli.command {
        Command::Init { force, .. } => {
            let config = config.context("configuration not loaded")?;
            init(&config, &state, force)
        }
        Command::Deposit { from, amount } => mutate(&state, |ledger| {
            ledger.deposit(from, Amount::from(amount))
        }),
        Command::Propose {
            caller,
            to,
            value,
            data,
        } => {
            let payload = parse_payload(data.as_deref())?;
            mutate(&state, |ledger| {
                ledger
                    .propose(&caller, to, Amount::from(value), payload)
                    .map(|_| ())
            })
        }
        Command::Confirm { caller, index } => {
            mutate(&state, |ledger| ledger.confirm(&caller, index))
        }
        Command::Reject { caller, index } => {
            mutate(&state, |ledger| ledger.reject(&caller, index))
        }
        Command::Show { index, json } => show(&load(&state)?, index, json),
        Command::Owners => {
            let ledger = load(&state)?;
            println!(
                "{} of {} owners required",
                ledger.get_confirmations_required(),
                ledger.get_owners().len()
            );
            for owner in ledger.get_owners() {
                println!("{owner}");
            }
            Ok(())
        }
        Command::Payouts => {
            for entry in read_journal(&journal_path(&state))? {
                println!(
                    "#{} {} -> {} data=0x{}",
                    entry.index, entry.value, entry.target, entry.payload
                );
            }
            Ok(())
        }
    }
}

/// `<state>.journal`, next to the snapshot and never equal to it.
fn journal_path(state: &Path) -> PathBuf {
    let mut name = state.as_os_str().to_owned();
    name.push(".journal");
    PathBuf::from(name)
}

fn init(config: &WalletConfig, state: &Path, force: bool) -> anyhow::Result<()> {
    let journal = journal_path(state);
    for existing in [state, journal.as_path()] {
        if existing.exists() && !force {
            bail!(
                "{} already exists; pass --force to overwrite",
                existing.display()
            );
        }
    }
    let mut ledger = config
        .build_ledger(JournalTransfer::new(&journal))
        .map_err(rejected)?;
    let funder = ledger.get_owners().first().copied();
    if let Some(funder) = funder.filter(|_| config.initial_deposit > 0) {
        ledger
            .deposit(funder, Amount::from(u128::from(config.initial_deposit)))
            .map_err(rejected)?;
    }
    if journal.exists() {
        fs::remove_file(&journal)
            .with_context(|| format!("clearing payout journal {}", journal.display()))?;
        tracing::warn!(journal = %journal.display(), "previous payout journal discarded");
    }
    store(&ledger, state)?;
    tracing::info!(state = %state.display(), "wallet initialised");
    print_events(&ledger);
    Ok(())
}

fn load(state: &Path) -> anyhow::Result<Ledger> {
    let snapshot = LedgerSnapshot::read_from(state)
        .with_context(|| format!("reading wallet state {}", state.display()))?;
    MultisigLedger::restore(snapshot, JournalTransfer::new(journal_path(state)))
        .map_err(rejected)
}

fn store(ledger: &Ledger, state: &Path) -> anyhow::Result<()> {
    ledger
        .snapshot()
        .write_to(state)
        .with_context(|| format!("writing wallet state {}", state.display()))
}

/// Load, apply one operation, persist on success.
fn mutate(
    state: &Path,
    op: impl FnOnce(&mut Ledger) -> Result<(), LedgerError>,
) -> anyhow::Result<()> {
    let mut ledger = load(state)?;
    op(&mut ledger).map_err(rejected)?;
    store(&ledger, state)?;
    print_events(&ledger);
    Ok(())
}

fn rejected(err: LedgerError) -> anyhow::Error {
    let code = err.code();
    anyhow::Error::new(err).context(code)
}

fn parse_payload(data: Option<&str>) -> anyhow::Result<Vec<u8>> {
    match data {
        None => Ok(Vec::new()),
        Some(raw) => {
            let digits = raw.strip_prefix("0x").unwrap_or(raw);
            hex::decode(digits).with_context(|| format!("invalid hex call data {raw:?}"))
        }
    }
}

fn print_events(ledger: &Ledger) {
    for event in ledger.events() {
        println!("{}", describe(event));
    }
}

fn describe(event: &LedgerEvent) -> String {
    match event {
        LedgerEvent::TransactionProposed {
            index,
            proposer,
            target,
            value,
        } => format!("TransactionProposed #{index} by {proposer}: {value} -> {target}"),
        LedgerEvent::TransactionConfirmed { index, voter } => {
            format!("TransactionConfirmed #{index} by {voter}")
        }
        LedgerEvent::TransactionRejected { index, voter } => {
            format!("TransactionRejected #{index} by {voter}")
        }
        LedgerEvent::TransactionExecuted { index } => format!("TransactionExecuted #{index}"),
        LedgerEvent::ProposalBlocked { index } => format!("ProposalBlocked #{index}"),
        LedgerEvent::Deposit {
            from,
            amount,
            balance,
        } => format!("Deposit {amount} from {from} (balance {balance})"),
    }
}

fn show(ledger: &Ledger, index: Option<TxIndex>, json: bool) -> anyhow::Result<()> {
    match index {
        Some(index) => {
            let tx = ledger.get_transaction(index).map_err(rejected)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&transaction_json(index, tx))?);
            } else {
                print_transaction(index, tx);
            }
        }
        None if json => {
            let summary = serde_json::json!({
                "owners": ledger.get_owners().iter().map(ToString::to_string).collect::<Vec<_>>(),
                "required_confirmations": ledger.get_confirmations_required(),
                "balance": ledger.balance().to_string(),
                "transactions": ledger
                    .get_transactions()
                    .iter()
                    .enumerate()
                    .map(|(i, tx)| transaction_json(i as TxIndex, tx))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        None => {
            println!(
                "balance {}, {} of {} owners required, {} transactions ({} pending)",
                ledger.balance(),
                ledger.get_confirmations_required(),
                ledger.get_owners().len(),
                ledger.get_transaction_count(),
                ledger.pending_transactions().count()
            );
            for (i, tx) in ledger.get_transactions().iter().enumerate() {
                print_transaction(i as TxIndex, tx);
            }
        }
    }
    Ok(())
}

fn print_transaction(index: TxIndex, tx: &Transaction) {
    println!(
        "#{index} {status} {value} -> {target} confirmations={c} rejections={r}",
        status = tx.status(),
        value = tx.value,
        target = tx.target,
        c = tx.confirmations,
        r = tx.rejections,
    );
}

fn transaction_json(index: TxIndex, tx: &Transaction) -> serde_json::Value {
    serde_json::json!({
        "index": index,
        "status": tx.status().to_string(),
        "proposer": tx.proposer.to_string(),
        "target": tx.target.to_string(),
        "value": tx.value.to_string(),
        "payload": hex::encode(&tx.payload),
        "confirmations": tx.confirmations,
        "rejections": tx.rejections,
        "voters": tx.voters().map(ToString::to_string).collect::<Vec<_>>(),
    })
}
