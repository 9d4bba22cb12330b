use axum::{
    extract::{Extension, Form, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::CurrentUser,
    render::{self, usd, Flash},
    services::account_service::TradeReceipt,
    AppState,
};

fn unauthorized(state: &AppState) -> Response {
    render::apology(state, StatusCode::UNAUTHORIZED, "Unauthorized", None)
}

/// Parses a share count; only plain positive integers are accepted.
pub fn parse_shares(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok().filter(|n| *n > 0)
}

#[derive(Deserialize)]
pub struct TradeForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: String,
}

#[derive(Deserialize)]
pub struct QuoteForm {
    #[serde(default)]
    pub symbol: String,
}

fn trade_message(verb: &str, r: &TradeReceipt) -> String {
    format!(
        "Successfully {verb} {} shares of {} at {} each.",
        r.shares,
        r.symbol,
        usd(r.price)
    )
}

// ---------------- QUOTE ----------------

// GET /quote
pub async fn get_quote(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    render::page(&state, StatusCode::OK, "Quote", "pages/quote", &json!({}), user_ref, None)
}

// POST /quote
pub async fn post_quote(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<QuoteForm>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);

    match state.accounts.quote(&form.symbol).await {
        Ok(q) => render::page(
            &state,
            StatusCode::OK,
            "Quoted",
            "pages/quoted",
            &json!({ "symbol": q.symbol, "name": q.name, "price": usd(q.price) }),
            user_ref,
            None,
        ),
        Err(e) => render::account_error(&state, &e, user_ref),
    }
}

// ---------------- BUY ----------------

// GET /buy
pub async fn get_buy(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    render::page(&state, StatusCode::OK, "Buy", "pages/buy", &json!({}), user_ref, None)
}

// POST /buy
pub async fn post_buy(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<TradeForm>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized(&state);
    };

    let Some(shares) = parse_shares(&form.shares) else {
        return render::apology(
            &state,
            StatusCode::BAD_REQUEST,
            "Number of shares must be a positive integer.",
            Some(&u),
        );
    };

    match state.accounts.buy(u.id, &form.symbol, shares).await {
        Ok(receipt) => {
            let jar = render::set_flash(jar, Flash::success(trade_message("bought", &receipt)));
            (jar, render::redirect(&headers, "/")).into_response()
        }
        Err(e) => render::account_error(&state, &e, Some(&u)),
    }
}

// ---------------- SELL ----------------

// GET /sell
pub async fn get_sell(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized(&state);
    };

    let holdings = match state.accounts.holdings(u.id).await {
        Ok(h) => h,
        Err(e) => return render::account_error(&state, &e, Some(&u)),
    };

    let items: Vec<serde_json::Value> = holdings
        .into_iter()
        .map(|(symbol, shares)| json!({ "symbol": symbol, "shares": shares }))
        .collect();

    render::page(
        &state,
        StatusCode::OK,
        "Sell",
        "pages/sell",
        &json!({ "has_holdings": !items.is_empty(), "holdings": items }),
        Some(&u),
        None,
    )
}

// POST /sell
pub async fn post_sell(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<TradeForm>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized(&state);
    };

    let Some(shares) = parse_shares(&form.shares) else {
        return render::apology(
            &state,
            StatusCode::BAD_REQUEST,
            "Number of shares must be a positive integer.",
            Some(&u),
        );
    };

    match state.accounts.sell(u.id, &form.symbol, shares).await {
        Ok(receipt) => {
            let jar = render::set_flash(jar, Flash::success(trade_message("sold", &receipt)));
            (jar, render::redirect(&headers, "/")).into_response()
        }
        Err(e) => render::account_error(&state, &e, Some(&u)),
    }
}
