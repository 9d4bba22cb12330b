use std::{net::SocketAddr, sync::Arc, time::Duration};

use mongodb::Client;
use tracing_subscriber::EnvFilter;

use papertrade::{
    config::{self, LedgerBackend},
    routes,
    services::{
        db_init, finnhub::FinnhubClient, ledger::LedgerStore, memory_ledger::MemoryLedgerStore,
        mongo_ledger::MongoLedgerStore,
    },
    templates, AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let settings = config::load();

    let ledger: Arc<dyn LedgerStore> = match settings.ledger_backend {
        LedgerBackend::Mongo => {
            let client = Client::with_uri_str(&settings.mongodb_uri)
                .await
                .map_err(|e| format!("failed to connect to MongoDB: {e}"))?;
            if let Err(e) = db_init::ensure_indexes(&client.database(&settings.mongodb_db)).await {
                tracing::warn!("could not ensure indexes: {e}");
            }
            Arc::new(MongoLedgerStore::new(client, &settings.mongodb_db))
        }
        LedgerBackend::Memory => {
            tracing::warn!("using in-memory ledger; data is lost on restart");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    if settings.finnhub_api_key.trim().is_empty() {
        tracing::warn!("FINNHUB_API_KEY is not set; quotes will be unavailable");
    }
    let quotes = FinnhubClient::new(
        settings.finnhub_api_key.clone(),
        Duration::from_secs(settings.quote_timeout_secs),
    )
    .map_err(|e| format!("failed to build quote client: {e}"))?;
    let quotes = Arc::new(quotes);

    let hbs = templates::build_handlebars().map_err(|e| format!("templates: {e}"))?;
    let state = AppState::new(hbs, ledger, quotes, settings.clone());

    let app = routes::app(state);

    let ip = settings
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|e| format!("invalid HOST {}: {e}", settings.host))?;
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {addr}: {e}"))?;
    axum::serve(listener, app).await.map_err(|e| e.to_string())
}
