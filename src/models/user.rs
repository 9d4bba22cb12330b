use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Starting balance for freshly registered users.
pub const DEFAULT_CASH: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 2);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub username: String,

    // bcrypt
    pub hash: String,

    pub cash: Decimal,

    pub created_at: i64,
}

/// The authenticated identity carried in request extensions.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    #[serde(serialize_with = "mongodb::bson::serde_helpers::serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub username: String,
}

impl From<User> for CurrentUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
        }
    }
}
