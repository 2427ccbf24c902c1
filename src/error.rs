//! Ledger error types

use std::path::PathBuf;
use thiserror::Error;

use crate::{ClientId, Money};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A required identifier or value was missing or malformed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown client, portfolio, security or holding
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation would break a structural invariant
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("insufficient funds for {client}: requires {required}, available {available}")]
    InsufficientFunds {
        client: ClientId,
        required: Money,
        available: Money,
    },

    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// An amount that cannot be represented as [`Money`]
    pub fn overflow(what: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("{} is out of range", what))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
