use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Local, Timelike};
use serde_json::json;

use crate::{
    models::CurrentUser,
    render::{self, usd},
    AppState,
};

fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}

// GET /  (portfolio)
pub async fn home(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    let (jar, flash) = render::take_flash(jar);

    let portfolio = match state.accounts.portfolio(u.id).await {
        Ok(p) => p,
        Err(e) => return (jar, render::account_error(&state, &e, Some(&u))).into_response(),
    };

    let rows: Vec<serde_json::Value> = portfolio
        .holdings
        .iter()
        .map(|h| {
            json!({
                "symbol": h.symbol,
                "name": h.name,
                "shares": h.shares,
                "price": usd(h.price),
                "value": usd(h.value),
                "stale": h.stale,
            })
        })
        .collect();

    let ctx = json!({
        "greeting": greeting(Local::now().hour()),
        "username": u.username,
        "holdings": rows,
        "has_holdings": !portfolio.holdings.is_empty(),
        "cash": usd(portfolio.cash),
        "holdings_value": usd(portfolio.holdings_value),
        "total": usd(portfolio.total),
    });

    let res = render::page(&state, StatusCode::OK, "Portfolio", "pages/index", &ctx, Some(&u), flash.as_ref());
    (jar, res).into_response()
}

pub async fn not_found(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> impl IntoResponse {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    render::page(&state, StatusCode::NOT_FOUND, "404", "pages/not_found", &json!({}), user_ref, None)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Html("ok".to_string()))
}

pub async fn health_db(State(state): State<AppState>) -> impl IntoResponse {
    match state.ledger.ping().await {
        Ok(()) => (StatusCode::OK, Html("ledger: ok".to_string())).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("ledger error: {}", e)),
        )
            .into_response(),
    }
}
