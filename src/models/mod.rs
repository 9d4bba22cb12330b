pub mod user;
pub mod transaction;

pub use user::{CurrentUser, User};
pub use transaction::{NewTransaction, Transaction};
