use axum::http::StatusCode;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::services::quotes::QuoteError;

/// Failures surfaced by the account operations.
///
/// Every variant is recoverable at the request boundary: the ledger is never
/// left half-updated when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Quote unavailable for {symbol}: {reason}")]
    QuoteUnavailable { symbol: String, reason: String },

    #[error("Insufficient funds: cash ${available:.2}, required ${required:.2}")]
    InsufficientFunds { available: Decimal, required: Decimal },

    #[error("Not enough shares of {symbol}: you own {owned}, tried to sell {requested}")]
    InsufficientShares {
        symbol: String,
        owned: i64,
        requested: i64,
    },

    #[error("{0}")]
    InvalidAmount(String),

    #[error("Username has already been taken!")]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Storage error: {0}")]
    Persistence(String),
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::UserNotFound => StatusCode::NOT_FOUND,
            AccountError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn quote(symbol: &str, err: QuoteError) -> Self {
        AccountError::QuoteUnavailable {
            symbol: symbol.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<mongodb::error::Error> for AccountError {
    fn from(e: mongodb::error::Error) -> Self {
        AccountError::Persistence(e.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AccountError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        AccountError::Persistence(e.to_string())
    }
}
