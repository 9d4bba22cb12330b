pub mod quotes;
pub mod finnhub;

pub mod ledger;
pub mod memory_ledger;
pub mod mongo_ledger;
pub mod db_init;

pub mod account_service;
pub mod portfolio_service;
pub mod auth_service;
pub mod user_service;
