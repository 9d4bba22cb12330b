use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Response,
};
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    models::CurrentUser,
    render::{self, usd},
    AppState,
};

// GET /history
pub async fn get_history(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return render::apology(&state, StatusCode::UNAUTHORIZED, "Unauthorized", None);
    };

    let txs = match state.accounts.history(u.id).await {
        Ok(t) => t,
        Err(e) => return render::account_error(&state, &e, Some(&u)),
    };

    let items: Vec<serde_json::Value> = txs
        .iter()
        .map(|t| {
            json!({
                "created_at": render::timestamp(t.created_at),
                "symbol": t.symbol,
                "side": if t.is_buy() { "Buy" } else { "Sell" },
                "side_class": if t.is_buy() { "text-success" } else { "text-danger" },
                "shares": t.shares,
                "price": usd(t.price),
                "total": usd(t.price * Decimal::from(t.shares.abs())),
            })
        })
        .collect();

    render::page(
        &state,
        StatusCode::OK,
        "History",
        "pages/history",
        &json!({ "has_items": !items.is_empty(), "items": items }),
        Some(&u),
        None,
    )
}
