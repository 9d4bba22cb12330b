#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use http_body_util::BodyExt;
use mongodb::bson::oid::ObjectId;
use papertrade::{
    config,
    models::CurrentUser,
    services::{
        memory_ledger::MemoryLedgerStore,
        quotes::{Quote, QuoteError, QuoteProvider},
    },
    templates, AppState,
};
use rust_decimal::Decimal;

/// Quote source with prices set by the test. Unknown symbols fail lookup.
#[derive(Default)]
pub struct FixedQuotes {
    prices: Mutex<HashMap<String, Decimal>>,
}

impl FixedQuotes {
    pub fn with(prices: &[(&str, i64)]) -> Arc<Self> {
        let q = Self::default();
        for (sym, price) in prices {
            q.set(sym, Decimal::from(*price));
        }
        Arc::new(q)
    }

    pub fn set(&self, symbol: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    pub fn remove(&self, symbol: &str) {
        self.prices.lock().unwrap().remove(symbol);
    }
}

#[async_trait]
impl QuoteProvider for FixedQuotes {
    async fn lookup(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let price = self
            .prices
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or(QuoteError::UnknownSymbol)?;

        Ok(Quote {
            symbol: symbol.to_string(),
            name: format!("{symbol} Inc."),
            price,
        })
    }
}

pub fn test_state_with(quotes: Arc<FixedQuotes>) -> AppState {
    let mut settings = config::load();
    settings.ledger_backend = config::LedgerBackend::Memory;
    settings.jwt_secret = "test-secret".to_string();
    settings.jwt_cookie_name = "auth".to_string();

    AppState::new(
        templates::build_handlebars().unwrap(),
        Arc::new(MemoryLedgerStore::new()),
        quotes,
        settings,
    )
}

pub fn test_state() -> AppState {
    test_state_with(FixedQuotes::with(&[("AAPL", 100), ("MSFT", 250)]))
}

/// Inserts a user straight into the ledger. The hash is not a valid bcrypt
/// hash, so this user cannot log in.
pub async fn seed_user(state: &AppState, username: &str, cash: i64) -> CurrentUser {
    let user = state
        .ledger
        .create_user(username, "not-a-hash", Decimal::from(cash))
        .await
        .unwrap();
    CurrentUser::from(user)
}

pub fn stranger() -> CurrentUser {
    CurrentUser {
        id: ObjectId::new(),
        username: "nobody".to_string(),
    }
}

pub async fn response_body_string(res: axum::response::Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

pub fn set_cookies(res: &axum::response::Response) -> Vec<String> {
    res.headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}
