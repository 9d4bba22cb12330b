use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub ledger_backend: LedgerBackend,
    pub host: String,
    pub port: u16,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,
    pub cookie_secure: bool,

    pub finnhub_api_key: String,
    pub quote_timeout_secs: u64,
}


pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017/?replicaSet=rs0".to_string());

    let mongodb_db = env::var("MONGODB_DB")
        .unwrap_or_else(|_| "papertrade".to_string());

    let ledger_backend = match env::var("LEDGER_STORE").as_deref() {
        Ok("memory") => LedgerBackend::Memory,
        _ => LedgerBackend::Mongo,
    };

    let host = env::var("HOST")
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-dev-secret".to_string());
    let jwt_cookie_name = env::var("JWT_COOKIE_NAME").unwrap_or_else(|_| "auth".to_string());
    let cookie_secure = env::var("COOKIE_SECURE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let finnhub_api_key = env::var("FINNHUB_API_KEY").unwrap_or_default();
    let quote_timeout_secs = env::var("QUOTE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(5);

    Settings {
        mongodb_uri,
        mongodb_db,
        ledger_backend,
        host,
        port,
        jwt_secret,
        jwt_cookie_name,
        cookie_secure,
        finnhub_api_key,
        quote_timeout_secs,
    }
}
