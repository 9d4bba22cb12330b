use std::{
    collections::BTreeMap,
    sync::{Arc, LazyLock},
};

use futures_util::future::join_all;
use mongodb::bson::oid::ObjectId;
use regex::Regex;
use rust_decimal::Decimal;

use crate::{
    error::AccountError,
    models::{NewTransaction, Transaction},
};

use super::{
    ledger::{AccountSnapshot, LedgerMutation, LedgerStore},
    portfolio_service::{self, Holding, Portfolio},
    quotes::{Quote, QuoteProvider},
};

/// Largest amount accepted by a single deposit.
pub const MAX_DEPOSIT: Decimal = Decimal::from_parts(15_000, 0, 0, false, 0);

static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,9}$").expect("symbol pattern"));

#[derive(Debug, Clone, PartialEq)]
pub struct TradeReceipt {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: Decimal,
    pub total: Decimal,
    pub cash: Decimal,
    pub transaction: Transaction,
}

/// Trims and upper-cases a ticker, rejecting anything that cannot be one.
pub fn normalize_symbol(raw: &str) -> Result<String, AccountError> {
    let sym = raw.trim().to_uppercase();
    if sym.is_empty() {
        return Err(AccountError::InvalidInput("Missing symbol.".into()));
    }
    if !SYMBOL_RE.is_match(&sym) {
        return Err(AccountError::InvalidInput(format!("Invalid stock symbol: {sym}")));
    }
    Ok(sym)
}

fn check_shares(shares: i64) -> Result<(), AccountError> {
    if shares <= 0 {
        return Err(AccountError::InvalidInput(
            "Number of shares must be a positive integer.".into(),
        ));
    }
    Ok(())
}

fn trade_value(price: Decimal, shares: i64) -> Result<Decimal, AccountError> {
    price
        .checked_mul(Decimal::from(shares))
        .ok_or_else(|| AccountError::InvalidInput("Quantity is too large.".into()))
}

pub fn decide_buy(
    snap: &AccountSnapshot,
    symbol: &str,
    shares: i64,
    price: Decimal,
) -> Result<LedgerMutation, AccountError> {
    let total = trade_value(price, shares)?;
    if snap.cash < total {
        return Err(AccountError::InsufficientFunds {
            available: snap.cash,
            required: total,
        });
    }

    Ok(LedgerMutation {
        cash: snap.cash - total,
        transaction: Some(NewTransaction {
            symbol: symbol.to_string(),
            shares,
            price,
        }),
    })
}

pub fn decide_sell(
    snap: &AccountSnapshot,
    symbol: &str,
    shares: i64,
    price: Decimal,
) -> Result<LedgerMutation, AccountError> {
    if shares > snap.shares_held {
        return Err(AccountError::InsufficientShares {
            symbol: symbol.to_string(),
            owned: snap.shares_held.max(0),
            requested: shares,
        });
    }
    let total = trade_value(price, shares)?;
    let cash = snap
        .cash
        .checked_add(total)
        .ok_or_else(|| AccountError::InvalidInput("Resulting balance is too large.".into()))?;

    Ok(LedgerMutation {
        cash,
        transaction: Some(NewTransaction {
            symbol: symbol.to_string(),
            shares: -shares,
            price,
        }),
    })
}

pub fn check_deposit(amount: Decimal) -> Result<(), AccountError> {
    if amount <= Decimal::ZERO {
        return Err(AccountError::InvalidAmount("Amount must be positive.".into()));
    }
    if amount > MAX_DEPOSIT {
        return Err(AccountError::InvalidAmount("Maximum deposit is $15,000.".into()));
    }
    Ok(())
}

pub fn decide_deposit(snap: &AccountSnapshot, amount: Decimal) -> Result<LedgerMutation, AccountError> {
    let cash = snap
        .cash
        .checked_add(amount)
        .ok_or_else(|| AccountError::InvalidAmount("Resulting balance is too large.".into()))?;

    Ok(LedgerMutation { cash, transaction: None })
}

/// Buy, sell and deposit against an injected ledger and quote source.
///
/// All cash and share invariants are checked here, inside the store's atomic
/// commit, so the check and the write cannot interleave with another request
/// on the same account.
#[derive(Clone)]
pub struct AccountService {
    ledger: Arc<dyn LedgerStore>,
    quotes: Arc<dyn QuoteProvider>,
}

impl AccountService {
    pub fn new(ledger: Arc<dyn LedgerStore>, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self { ledger, quotes }
    }

    /// Quote with a usable (positive) price for a normalized symbol.
    pub async fn quote(&self, symbol: &str) -> Result<Quote, AccountError> {
        let sym = normalize_symbol(symbol)?;
        let quote = self
            .quotes
            .lookup(&sym)
            .await
            .map_err(|e| AccountError::quote(&sym, e))?;

        if quote.price <= Decimal::ZERO {
            return Err(AccountError::QuoteUnavailable {
                symbol: sym,
                reason: "no price".into(),
            });
        }
        Ok(quote)
    }

    pub async fn buy(&self, user_id: ObjectId, symbol: &str, shares: i64) -> Result<TradeReceipt, AccountError> {
        check_shares(shares)?;
        let quote = self.quote(symbol).await?;
        let price = quote.price;
        let sym = quote.symbol.clone();

        let committed = self
            .ledger
            .commit(user_id, Some(&sym), &|snap: &AccountSnapshot| decide_buy(snap, &sym, shares, price))
            .await
            .inspect_err(|e| tracing::warn!(%user_id, symbol = %sym, shares, error = %e, "buy rejected"))?;

        tracing::info!(%user_id, symbol = %sym, shares, %price, "buy committed");
        receipt(quote, shares, committed.cash, committed.transaction)
    }

    pub async fn sell(&self, user_id: ObjectId, symbol: &str, shares: i64) -> Result<TradeReceipt, AccountError> {
        check_shares(shares)?;
        let quote = self.quote(symbol).await?;
        let price = quote.price;
        let sym = quote.symbol.clone();

        let committed = self
            .ledger
            .commit(user_id, Some(&sym), &|snap: &AccountSnapshot| decide_sell(snap, &sym, shares, price))
            .await
            .inspect_err(|e| tracing::warn!(%user_id, symbol = %sym, shares, error = %e, "sell rejected"))?;

        tracing::info!(%user_id, symbol = %sym, shares, %price, "sell committed");
        receipt(quote, shares, committed.cash, committed.transaction)
    }

    /// Adds cash; returns the new balance. No ledger entry is written.
    pub async fn deposit(&self, user_id: ObjectId, amount: Decimal) -> Result<Decimal, AccountError> {
        check_deposit(amount)?;

        let committed = self
            .ledger
            .commit(user_id, None, &|snap: &AccountSnapshot| decide_deposit(snap, amount))
            .await?;

        tracing::info!(%user_id, %amount, "deposit committed");
        Ok(committed.cash)
    }

    pub async fn cash(&self, user_id: ObjectId) -> Result<Decimal, AccountError> {
        self.ledger
            .find_user(user_id)
            .await?
            .map(|u| u.cash)
            .ok_or(AccountError::UserNotFound)
    }

    /// Transactions newest first.
    pub async fn history(&self, user_id: ObjectId) -> Result<Vec<Transaction>, AccountError> {
        self.ledger.list_transactions(user_id, None).await
    }

    pub async fn holdings(&self, user_id: ObjectId) -> Result<BTreeMap<String, i64>, AccountError> {
        let txs = self.ledger.list_transactions(user_id, None).await?;
        Ok(portfolio_service::owned_shares(&txs))
    }

    /// Current holdings priced from the quote source. A failed lookup falls
    /// back to the last traded price instead of failing the whole view.
    pub async fn portfolio(&self, user_id: ObjectId) -> Result<Portfolio, AccountError> {
        let cash = self.cash(user_id).await?;
        let txs = self.ledger.list_transactions(user_id, None).await?;
        let positions = portfolio_service::aggregate_positions(&txs);

        let lookups = positions.iter().map(|p| self.quotes.lookup(&p.symbol));
        let quotes = join_all(lookups).await;

        let holdings = positions
            .into_iter()
            .zip(quotes)
            .map(|(p, q)| {
                let (name, price, stale) = match q {
                    Ok(q) if q.price > Decimal::ZERO => (q.name, q.price, false),
                    Ok(_) => (p.symbol.clone(), p.last_price, true),
                    Err(e) => {
                        tracing::warn!(symbol = %p.symbol, error = %e, "quote failed, using last traded price");
                        (p.symbol.clone(), p.last_price, true)
                    }
                };
                Holding {
                    value: price * Decimal::from(p.shares),
                    symbol: p.symbol,
                    name,
                    shares: p.shares,
                    price,
                    stale,
                }
            })
            .collect();

        Ok(Portfolio::new(holdings, cash))
    }
}

fn receipt(
    quote: Quote,
    shares: i64,
    cash: Decimal,
    transaction: Option<Transaction>,
) -> Result<TradeReceipt, AccountError> {
    let transaction =
        transaction.ok_or_else(|| AccountError::Persistence("trade committed without a ledger entry".into()))?;

    Ok(TradeReceipt {
        total: quote.price * Decimal::from(shares),
        symbol: quote.symbol,
        name: quote.name,
        shares,
        price: quote.price,
        cash,
        transaction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(cash: i64, shares_held: i64) -> AccountSnapshot {
        AccountSnapshot {
            user_id: ObjectId::new(),
            cash: Decimal::from(cash),
            shares_held,
        }
    }

    #[test]
    fn normalize_symbol_trims_and_uppercases() {
        assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
    }

    #[test]
    fn normalize_symbol_rejects_garbage() {
        assert!(matches!(normalize_symbol("   "), Err(AccountError::InvalidInput(_))));
        assert!(matches!(normalize_symbol("A B"), Err(AccountError::InvalidInput(_))));
        assert!(matches!(normalize_symbol("<script>"), Err(AccountError::InvalidInput(_))));
    }

    #[test]
    fn buy_at_exact_balance_is_allowed() {
        let m = decide_buy(&snap(1000, 0), "AAPL", 10, Decimal::from(100)).unwrap();
        assert_eq!(m.cash, Decimal::ZERO);
        assert_eq!(m.transaction.unwrap().shares, 10);
    }

    #[test]
    fn buy_over_balance_is_rejected() {
        let err = decide_buy(&snap(999, 0), "AAPL", 10, Decimal::from(100)).unwrap_err();
        assert_eq!(
            err,
            AccountError::InsufficientFunds {
                available: Decimal::from(999),
                required: Decimal::from(1000),
            }
        );
    }

    #[test]
    fn sell_records_negative_shares() {
        let m = decide_sell(&snap(0, 5), "AAPL", 5, Decimal::from(120)).unwrap();
        assert_eq!(m.cash, Decimal::from(600));
        assert_eq!(m.transaction.unwrap().shares, -5);
    }

    #[test]
    fn sell_more_than_held_is_rejected() {
        let err = decide_sell(&snap(0, 4), "AAPL", 5, Decimal::from(120)).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientShares { owned: 4, requested: 5, .. }));
    }

    #[test]
    fn sell_into_a_full_balance_is_rejected_not_a_panic() {
        let full = AccountSnapshot {
            user_id: ObjectId::new(),
            cash: Decimal::MAX,
            shares_held: 5,
        };
        let err = decide_sell(&full, "AAPL", 5, Decimal::from(120)).unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput(_)));

        let err = decide_deposit(&full, Decimal::ONE).unwrap_err();
        assert!(matches!(err, AccountError::InvalidAmount(_)));
    }

    #[test]
    fn deposit_adds_to_cash_without_a_ledger_entry() {
        let m = decide_deposit(&snap(10, 0), Decimal::new(550, 2)).unwrap();
        assert_eq!(m.cash, Decimal::new(1_550, 2));
        assert!(m.transaction.is_none());
    }

    #[test]
    fn deposit_bounds() {
        assert!(check_deposit(Decimal::from(15_000)).is_ok());
        assert!(check_deposit(Decimal::new(1, 2)).is_ok());
        assert!(check_deposit(Decimal::ZERO).is_err());
        assert!(check_deposit(Decimal::from(-5)).is_err());
        assert!(check_deposit(Decimal::new(1_500_001, 2)).is_err());
    }

    #[test]
    fn non_positive_shares_are_invalid_input() {
        assert!(matches!(check_shares(0), Err(AccountError::InvalidInput(_))));
        assert!(matches!(check_shares(-3), Err(AccountError::InvalidInput(_))));
    }
}
