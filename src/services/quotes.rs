use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// A point-in-time price for a ticker symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("quote provider is not configured")]
    NotConfigured,

    #[error("unknown symbol")]
    UnknownSymbol,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned {0}")]
    Upstream(String),

    #[error("could not read provider response: {0}")]
    Decode(String),
}

/// Source of market prices.
///
/// Any non-positive price is reported as an error, never as a quote.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Result<Quote, QuoteError>;
}
