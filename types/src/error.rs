//! Errors raised while constructing fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid account id: {0}")]
    InvalidAccount(String),
}
