//! Library entrypoint for PaperTrade.
//!
//! The binary in `main.rs` only wires settings, storage and the router; the
//! integration tests under `tests/` build the same `AppState` with in-memory
//! collaborators.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;

#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;

#[path = "views/render.rs"]
pub mod render;
#[path = "views/templates.rs"]
pub mod templates;

pub mod controllers;
pub mod routes;

use services::{account_service::AccountService, ledger::LedgerStore, quotes::QuoteProvider};

#[derive(Clone)]
pub struct AppState {
    pub hbs: templates::Hbs,
    pub ledger: Arc<dyn LedgerStore>,
    pub accounts: AccountService,
    pub settings: config::Settings,
}

impl AppState {
    pub fn new(
        hbs: templates::Hbs,
        ledger: Arc<dyn LedgerStore>,
        quotes: Arc<dyn QuoteProvider>,
        settings: config::Settings,
    ) -> Self {
        let accounts = AccountService::new(ledger.clone(), quotes);
        Self {
            hbs,
            ledger,
            accounts,
            settings,
        }
    }
}
