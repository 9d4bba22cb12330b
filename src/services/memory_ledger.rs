use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::{
    error::AccountError,
    models::{Transaction, User},
};

use super::ledger::{AccountSnapshot, Committed, Decide, LedgerStore, net_shares};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    // append-only, oldest first
    transactions: Vec<Transaction>,
}

/// Process-local ledger. One lock covers load, decide and apply, so commits
/// are serialized across all users.
#[derive(Default)]
pub struct MemoryLedgerStore {
    tables: Mutex<Tables>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn ping(&self) -> Result<(), AccountError> {
        Ok(())
    }

    async fn create_user(&self, username: &str, hash: &str, cash: Decimal) -> Result<User, AccountError> {
        let mut t = self.tables.lock().await;

        if t.users.iter().any(|u| u.username == username) {
            return Err(AccountError::UsernameTaken);
        }

        let user = User {
            id: ObjectId::new(),
            username: username.to_string(),
            hash: hash.to_string(),
            cash,
            created_at: Utc::now().timestamp_millis(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, AccountError> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AccountError> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn set_password_hash(&self, id: ObjectId, hash: &str) -> Result<(), AccountError> {
        let mut t = self.tables.lock().await;
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AccountError::UserNotFound)?;
        user.hash = hash.to_string();
        Ok(())
    }

    async fn list_transactions(
        &self,
        user_id: ObjectId,
        symbol: Option<&str>,
    ) -> Result<Vec<Transaction>, AccountError> {
        let t = self.tables.lock().await;
        let mut out: Vec<Transaction> = t
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.user_id == user_id && symbol.is_none_or(|s| tx.symbol == s))
            .cloned()
            .collect();
        // stable: equal timestamps keep newest-inserted first
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn commit(
        &self,
        user_id: ObjectId,
        symbol: Option<&str>,
        decide: &Decide<'_>,
    ) -> Result<Committed, AccountError> {
        let mut t = self.tables.lock().await;

        let cash = t
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.cash)
            .ok_or(AccountError::UserNotFound)?;

        let shares_held = match symbol {
            Some(s) => net_shares(t.transactions.iter().filter(|tx| tx.user_id == user_id && tx.symbol == s)),
            None => 0,
        };

        let mutation = decide(&AccountSnapshot {
            user_id,
            cash,
            shares_held,
        })?;

        let transaction = mutation
            .transaction
            .map(|new| Transaction::from_new(user_id, new, Utc::now().timestamp_millis()));

        if let Some(tx) = &transaction {
            t.transactions.push(tx.clone());
        }
        if let Some(user) = t.users.iter_mut().find(|u| u.id == user_id) {
            user.cash = mutation.cash;
        }

        Ok(Committed {
            cash: mutation.cash,
            transaction,
        })
    }
}
