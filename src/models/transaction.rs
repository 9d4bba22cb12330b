use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One immutable ledger entry. `shares` is signed: positive for a buy,
/// negative for a sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,
    pub symbol: String,

    pub shares: i64,
    pub price: Decimal,

    // unix millis
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
}

impl Transaction {
    pub fn from_new(user_id: ObjectId, new: NewTransaction, created_at: i64) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            symbol: new.symbol,
            shares: new.shares,
            price: new.price,
            created_at,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.shares > 0
    }
}
