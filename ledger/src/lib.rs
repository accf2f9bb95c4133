//! Multi-signature authorization ledger.
//!
//! A wallet controlled by a fixed set of owners. Any owner may propose an
//! outbound transfer; it executes once `required_confirmations` distinct
//! owners approve, and is closed for good as soon as enough owners reject
//! that the threshold can no longer be reached.
//!
//! Key rules:
//! - the proposer's approval is counted at creation, so a threshold of 1
//!   executes in the proposing call;
//! - an owner votes at most once per proposal, confirm or reject;
//! - `Executed` and `Rejected` are terminal.

pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod owners;
pub mod snapshot;
pub mod transaction;

pub use config::WalletConfig;
pub use error::LedgerError;
pub use event::{EventBus, LedgerEvent};
pub use ledger::{quorum_unreachable, MultisigLedger};
pub use owners::OwnerSet;
pub use snapshot::LedgerSnapshot;
pub use transaction::{Transaction, TxStatus};
