use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use mongodb::{
    Client, ClientSession, Collection, Database,
    bson::{Document, doc, oid::ObjectId, to_bson},
    error::{TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::{Acknowledgment, FindOptions, ReadConcern, TransactionOptions, WriteConcern},
};
use rust_decimal::Decimal;

use crate::{
    error::AccountError,
    models::{Transaction, User},
};

use super::ledger::{AccountSnapshot, Committed, Decide, LedgerStore};

const USERS: &str = "users";
const TRANSACTIONS: &str = "transactions";

const MAX_COMMIT_ATTEMPTS: usize = 5;

/// MongoDB-backed ledger. Commits run in a multi-document transaction, which
/// needs a replica set (a single-node one is enough).
#[derive(Clone)]
pub struct MongoLedgerStore {
    client: Client,
    db: Database,
}

/// Why one commit attempt did not go through.
#[derive(Debug, Clone, PartialEq)]
enum CommitFailure {
    /// The decision step refused the operation.
    Rejected(AccountError),
    /// Write conflict or similar; safe to rerun against a fresh snapshot.
    Transient(String),
    Fatal(String),
}

impl From<mongodb::error::Error> for CommitFailure {
    fn from(e: mongodb::error::Error) -> Self {
        if e.contains_label(TRANSIENT_TRANSACTION_ERROR) {
            CommitFailure::Transient(e.to_string())
        } else {
            CommitFailure::Fatal(e.to_string())
        }
    }
}

/// `Ok(())` when attempt number `attempt` may be followed by another one,
/// otherwise the error to return to the caller.
fn retry_or_fail(failure: CommitFailure, attempt: usize) -> Result<(), AccountError> {
    match failure {
        CommitFailure::Rejected(e) => Err(e),
        CommitFailure::Transient(_) if attempt < MAX_COMMIT_ATTEMPTS => Ok(()),
        CommitFailure::Transient(msg) => Err(AccountError::Persistence(format!(
            "gave up after {MAX_COMMIT_ATTEMPTS} conflicting attempts: {msg}"
        ))),
        CommitFailure::Fatal(msg) => Err(AccountError::Persistence(msg)),
    }
}

impl MongoLedgerStore {
    pub fn new(client: Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self { client, db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection::<User>(USERS)
    }

    fn transactions(&self) -> Collection<Transaction> {
        self.db.collection::<Transaction>(TRANSACTIONS)
    }

    fn transaction_options() -> TransactionOptions {
        TransactionOptions::builder()
            .read_concern(ReadConcern::snapshot())
            .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
            .build()
    }

    async fn run_commit(
        &self,
        session: &mut ClientSession,
        user_id: ObjectId,
        symbol: Option<&str>,
        decide: &Decide<'_>,
    ) -> Result<Committed, CommitFailure> {
        let user = self
            .users()
            .find_one_with_session(doc! { "_id": user_id }, None, session)
            .await?
            .ok_or(CommitFailure::Rejected(AccountError::UserNotFound))?;

        let mut shares_held = 0i64;
        if let Some(sym) = symbol {
            let mut cursor = self
                .transactions()
                .find_with_session(doc! { "user_id": user_id, "symbol": sym }, None, session)
                .await?;
            while let Some(tx) = cursor.next(session).await {
                shares_held += tx?.shares;
            }
        }

        let mutation = decide(&AccountSnapshot {
            user_id,
            cash: user.cash,
            shares_held,
        })
        .map_err(CommitFailure::Rejected)?;

        let cash = to_bson(&mutation.cash).map_err(|e| CommitFailure::Fatal(e.to_string()))?;

        // every commit bumps `rev` so concurrent commits on one user always conflict
        self.users()
            .update_one_with_session(
                doc! { "_id": user_id },
                doc! { "$set": { "cash": cash }, "$inc": { "rev": 1_i64 } },
                None,
                session,
            )
            .await?;

        let transaction = match mutation.transaction {
            Some(new) => {
                let tx = Transaction::from_new(user_id, new, Utc::now().timestamp_millis());
                self.transactions().insert_one_with_session(&tx, None, session).await?;
                Some(tx)
            }
            None => None,
        };

        Ok(Committed {
            cash: mutation.cash,
            transaction,
        })
    }

    async fn commit_with_retry(session: &mut ClientSession) -> Result<(), mongodb::error::Error> {
        let mut attempt = 1;
        loop {
            match session.commit_transaction().await {
                Err(e) if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT) && attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "commit result unknown, retrying commit");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl LedgerStore for MongoLedgerStore {
    async fn ping(&self) -> Result<(), AccountError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn create_user(&self, username: &str, hash: &str, cash: Decimal) -> Result<User, AccountError> {
        let user = User {
            id: ObjectId::new(),
            username: username.to_string(),
            hash: hash.to_string(),
            cash,
            created_at: Utc::now().timestamp_millis(),
        };

        if let Err(e) = self.users().insert_one(&user, None).await {
            if e.to_string().contains("E11000") {
                return Err(AccountError::UsernameTaken);
            }
            return Err(e.into());
        }

        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, AccountError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AccountError> {
        Ok(self.users().find_one(doc! { "username": username }, None).await?)
    }

    async fn set_password_hash(&self, id: ObjectId, hash: &str) -> Result<(), AccountError> {
        let res = self
            .users()
            .update_one(doc! { "_id": id }, doc! { "$set": { "hash": hash } }, None)
            .await?;
        if res.matched_count == 0 {
            return Err(AccountError::UserNotFound);
        }
        Ok(())
    }

    async fn list_transactions(
        &self,
        user_id: ObjectId,
        symbol: Option<&str>,
    ) -> Result<Vec<Transaction>, AccountError> {
        let mut filter: Document = doc! { "user_id": user_id };
        if let Some(sym) = symbol {
            filter.insert("symbol", sym);
        }
        let find_opts = FindOptions::builder().sort(doc! { "created_at": -1, "_id": -1 }).build();

        let mut cursor = self.transactions().find(filter, find_opts).await?;

        let mut out: Vec<Transaction> = vec![];
        while let Some(res) = cursor.next().await {
            out.push(res?);
        }
        Ok(out)
    }

    async fn commit(
        &self,
        user_id: ObjectId,
        symbol: Option<&str>,
        decide: &Decide<'_>,
    ) -> Result<Committed, AccountError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let mut session = self.client.start_session(None).await?;
            session.start_transaction(Self::transaction_options()).await?;

            let failure = match self.run_commit(&mut session, user_id, symbol, decide).await {
                Ok(committed) => match Self::commit_with_retry(&mut session).await {
                    Ok(()) => return Ok(committed),
                    Err(e) => CommitFailure::from(e),
                },
                Err(f) => {
                    let _ = session.abort_transaction().await;
                    f
                }
            };

            match retry_or_fail(failure, attempt) {
                Ok(()) => tracing::warn!(%user_id, attempt, "ledger write conflict, retrying"),
                Err(e) => {
                    if let AccountError::Persistence(msg) = &e {
                        tracing::error!(%user_id, attempt, error = %msg, "ledger commit failed");
                    }
                    return Err(e);
                }
            }
        }

        Err(AccountError::Persistence(format!(
            "gave up after {MAX_COMMIT_ATTEMPTS} conflicting attempts"
        )))
    }
}
