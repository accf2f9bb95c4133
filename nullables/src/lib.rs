//! Nullable infrastructure for deterministic testing.
//!
//! External collaborators of the ledger are abstracted behind traits. This
//! crate provides test-friendly implementations that:
//! - Return deterministic results
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod transfer;

pub use transfer::NullTransfer;
