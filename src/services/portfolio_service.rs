use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::Transaction;

/// Net position in one symbol, derived from the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub shares: i64,
    /// Price of the most recent transaction in this symbol.
    pub last_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: Decimal,
    pub value: Decimal,
    /// Priced from the ledger because the quote lookup failed.
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
    pub cash: Decimal,
    pub holdings_value: Decimal,
    pub total: Decimal,
}

impl Portfolio {
    pub fn new(holdings: Vec<Holding>, cash: Decimal) -> Self {
        let holdings_value: Decimal = holdings.iter().map(|h| h.value).sum();
        Self {
            holdings,
            cash,
            holdings_value,
            total: cash + holdings_value,
        }
    }
}

/// Folds transactions into per-symbol positions, keeping only symbols with a
/// positive net share count. Output is ordered by symbol.
///
/// `last_price` comes from the entry with the greatest `created_at`; on ties
/// the one listed first wins, which matches the newest-first order the
/// ledger returns.
pub fn aggregate_positions(txs: &[Transaction]) -> Vec<Position> {
    let mut acc: BTreeMap<&str, (i64, Decimal, i64)> = BTreeMap::new();

    for tx in txs {
        let entry = acc
            .entry(tx.symbol.as_str())
            .or_insert((0, tx.price, tx.created_at));
        entry.0 += tx.shares;
        if tx.created_at > entry.2 {
            entry.1 = tx.price;
            entry.2 = tx.created_at;
        }
    }

    acc.into_iter()
        .filter(|(_, (shares, _, _))| *shares > 0)
        .map(|(symbol, (shares, last_price, _))| Position {
            symbol: symbol.to_string(),
            shares,
            last_price,
        })
        .collect()
}

/// Owned symbols with their net share counts.
pub fn owned_shares(txs: &[Transaction]) -> BTreeMap<String, i64> {
    aggregate_positions(txs)
        .into_iter()
        .map(|p| (p.symbol, p.shares))
        .collect()
}
