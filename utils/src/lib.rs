//! Shared utilities for the multisig wallet.

pub mod logging;

pub use logging::{init_logging, LogFormat};
