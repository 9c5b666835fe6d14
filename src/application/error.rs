use thiserror::Error;

use crate::domain::{CustomerId, EntryId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ledger service unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Ledger service answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response from ledger service: {0}")]
    Decode(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("Entry {0} could not be settled: {1}")]
    SettleRejected(EntryId, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Message suitable for a transient notice, preferring what the server said.
    pub fn notice_text(&self) -> String {
        match self {
            AppError::Status { message, .. } if !message.is_empty() => message.clone(),
            AppError::SettleRejected(_, message) => message.clone(),
            other => other.to_string(),
        }
    }
}
