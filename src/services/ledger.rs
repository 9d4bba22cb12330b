use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;

use crate::{
    error::AccountError,
    models::{NewTransaction, Transaction, User},
};

/// What a commit sees of an account at the start of its atomic section.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub user_id: ObjectId,
    pub cash: Decimal,
    /// Net shares of the symbol the commit was opened for (0 without a symbol).
    pub shares_held: i64,
}

/// The writes a commit applies: the new cash balance and, for trades, one
/// ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerMutation {
    pub cash: Decimal,
    pub transaction: Option<NewTransaction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub cash: Decimal,
    pub transaction: Option<Transaction>,
}

/// Decision step run inside a commit. May be invoked more than once when the
/// store retries after a conflict, always with a fresh snapshot.
pub type Decide<'a> = dyn Fn(&AccountSnapshot) -> Result<LedgerMutation, AccountError> + Send + Sync + 'a;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn ping(&self) -> Result<(), AccountError>;

    async fn create_user(&self, username: &str, hash: &str, cash: Decimal) -> Result<User, AccountError>;

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, AccountError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AccountError>;

    async fn set_password_hash(&self, id: ObjectId, hash: &str) -> Result<(), AccountError>;

    /// Transactions of a user, optionally for one symbol, newest first.
    async fn list_transactions(&self, user_id: ObjectId, symbol: Option<&str>)
    -> Result<Vec<Transaction>, AccountError>;

    /// Loads the account, runs `decide` and applies its mutation atomically.
    /// Nothing is written when `decide` or any write fails.
    async fn commit(
        &self,
        user_id: ObjectId,
        symbol: Option<&str>,
        decide: &Decide<'_>,
    ) -> Result<Committed, AccountError>;
}

/// Sums signed share counts.
pub fn net_shares<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> i64 {
    txs.into_iter().map(|t| t.shares).sum()
}
