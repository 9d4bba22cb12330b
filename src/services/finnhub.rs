use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde::Deserialize;

use super::quotes::{Quote, QuoteError, QuoteProvider};

const BASE_URL: &str = "https://finnhub.io/api/v1";

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, api_key })
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str, symbol: &str) -> Result<T, QuoteError> {
        if !self.has_key() {
            return Err(QuoteError::NotConfigured);
        }

        let res = self
            .http
            .get(format!("{BASE_URL}{path}"))
            .query(&[("symbol", symbol), ("token", &self.api_key)])
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(QuoteError::Upstream(format!("{status} {body}")));
        }

        res.json::<T>().await.map_err(|e| QuoteError::Decode(e.to_string()))
    }

    pub async fn quote(&self, symbol: &str) -> Result<QuoteResponse, QuoteError> {
        self.get_json("/quote", symbol).await
    }

    pub async fn profile(&self, symbol: &str) -> Result<ProfileResponse, QuoteError> {
        self.get_json("/stock/profile2", symbol).await
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    async fn lookup(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let price = quoted_price(self.quote(symbol).await?.c)?;

        let name = match self.profile(symbol).await {
            Ok(p) if !p.name.trim().is_empty() => p.name,
            Ok(_) => symbol.to_string(),
            Err(e) => {
                tracing::debug!(%symbol, error = %e, "profile lookup failed, using symbol as name");
                symbol.to_string()
            }
        };

        Ok(Quote {
            symbol: symbol.to_string(),
            name,
            price,
        })
    }
}

/// Finnhub reports unknown symbols as an all-zero quote.
fn quoted_price(c: f64) -> Result<Decimal, QuoteError> {
    Decimal::from_f64(c)
        .map(|p| p.round_dp(4))
        .filter(|p| *p > Decimal::ZERO)
        .ok_or(QuoteError::UnknownSymbol)
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    // current price
    #[serde(default)]
    pub c: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_negative_price_means_unknown_symbol() {
        assert_eq!(quoted_price(0.0), Err(QuoteError::UnknownSymbol));
        assert_eq!(quoted_price(-1.5), Err(QuoteError::UnknownSymbol));
        assert_eq!(quoted_price(f64::NAN), Err(QuoteError::UnknownSymbol));
    }

    #[test]
    fn price_is_rounded_to_four_places() {
        assert_eq!(quoted_price(189.123456).unwrap(), Decimal::new(1_891_235, 4));
    }

    #[test]
    fn quote_body_without_price_decodes_as_zero() {
        let q: QuoteResponse = serde_json::from_str(r#"{"d":null,"dp":null}"#).unwrap();
        assert_eq!(q.c, 0.0);
    }

    #[tokio::test]
    async fn lookup_without_api_key_is_not_configured() {
        let client = FinnhubClient::new(String::new(), Duration::from_secs(1)).unwrap();
        assert_eq!(client.lookup("AAPL").await, Err(QuoteError::NotConfigured));
    }
}
