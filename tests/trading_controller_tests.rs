mod common;

use axum::{
    http::{header, Request, StatusCode},
    routing::{get, post},
    Router,
};
use common::{response_body_string, seed_user, set_cookies, test_state};
use papertrade::controllers::trading_controller;
use papertrade::models::CurrentUser;
use rust_decimal::Decimal;
use tower::ServiceExt;

fn form_request(uri: &str, body: &'static str, user: Option<CurrentUser>) -> Request<axum::body::Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(axum::body::Body::from(body))
        .unwrap();
    if let Some(u) = user {
        req.extensions_mut().insert(u);
    }
    req
}

fn trade_app(state: papertrade::AppState) -> Router {
    Router::new()
        .route("/quote", post(trading_controller::post_quote))
        .route("/buy", post(trading_controller::post_buy))
        .route("/sell", get(trading_controller::get_sell).post(trading_controller::post_sell))
        .with_state(state)
}

#[tokio::test]
async fn post_buy_unauthorized_returns_401() {
    let app = trade_app(test_state());

    let res = app.oneshot(form_request("/buy", "symbol=AAPL&shares=1", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = response_body_string(res).await;
    assert!(body.to_lowercase().contains("unauthorized"));
}

#[tokio::test]
async fn post_sell_unauthorized_returns_401() {
    let app = trade_app(test_state());

    let res = app.oneshot(form_request("/sell", "symbol=AAPL&shares=1", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_buy_invalid_shares_renders_error() {
    let state = test_state();
    let user = seed_user(&state, "tester", 10_000).await;

    for body in ["symbol=AAPL&shares=abc", "symbol=AAPL&shares=0", "symbol=AAPL&shares=-5", "symbol=AAPL&shares=1.5"] {
        let app = trade_app(state.clone());
        let res = app.oneshot(form_request("/buy", body, Some(user.clone()))).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");

        let body = response_body_string(res).await;
        assert!(body.contains("Number of shares must be a positive integer."));
    }
}

#[tokio::test]
async fn post_sell_invalid_shares_renders_error() {
    let state = test_state();
    let user = seed_user(&state, "tester", 10_000).await;
    let app = trade_app(state);

    let res = app
        .oneshot(form_request("/sell", "symbol=AAPL&shares=", Some(user)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_body_string(res).await;
    assert!(body.contains("Number of shares must be a positive integer."));
}

#[tokio::test]
async fn post_buy_missing_symbol_renders_error() {
    let state = test_state();
    let user = seed_user(&state, "tester", 10_000).await;
    let app = trade_app(state);

    let res = app
        .oneshot(form_request("/buy", "symbol=%20&shares=1", Some(user)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_body_string(res).await;
    assert!(body.contains("Missing symbol."));
}

#[tokio::test]
async fn post_buy_success_redirects_home_with_flash() {
    let state = test_state();
    let user = seed_user(&state, "tester", 10_000).await;
    let app = trade_app(state.clone());

    let res = app
        .oneshot(form_request("/buy", "symbol=aapl&shares=2", Some(user.clone())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/");
    assert!(set_cookies(&res).iter().any(|c| c.starts_with("flash=")));

    assert_eq!(state.accounts.cash(user.id).await.unwrap(), Decimal::from(9_800));
}

#[tokio::test]
async fn post_buy_htmx_uses_hx_redirect() {
    let state = test_state();
    let user = seed_user(&state, "tester", 10_000).await;
    let app = trade_app(state);

    let mut req = form_request("/buy", "symbol=AAPL&shares=1", Some(user));
    req.headers_mut().insert("HX-Request", "true".parse().unwrap());

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("HX-Redirect").unwrap(), "/");
}

#[tokio::test]
async fn post_buy_insufficient_funds_renders_apology() {
    let state = test_state();
    let user = seed_user(&state, "tester", 150).await;
    let app = trade_app(state.clone());

    let res = app
        .oneshot(form_request("/buy", "symbol=AAPL&shares=2", Some(user.clone())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_body_string(res).await;
    assert!(body.contains("Insufficient funds"));
    assert_eq!(state.accounts.cash(user.id).await.unwrap(), Decimal::from(150));
}

#[tokio::test]
async fn post_sell_more_than_owned_renders_apology() {
    let state = test_state();
    let user = seed_user(&state, "tester", 10_000).await;
    state.accounts.buy(user.id, "AAPL", 1).await.unwrap();
    let app = trade_app(state);

    let res = app
        .oneshot(form_request("/sell", "symbol=AAPL&shares=2", Some(user)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_body_string(res).await;
    assert!(body.contains("Not enough shares of AAPL"));
}

#[tokio::test]
async fn get_sell_lists_owned_symbols() {
    let state = test_state();
    let user = seed_user(&state, "tester", 10_000).await;
    state.accounts.buy(user.id, "MSFT", 2).await.unwrap();
    let app = trade_app(state);

    let mut req = Request::builder().uri("/sell").body(axum::body::Body::empty()).unwrap();
    req.extensions_mut().insert(user);

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains(r#"<option value="MSFT">MSFT (2)</option>"#));
}

#[tokio::test]
async fn post_quote_shows_price() {
    let app = trade_app(test_state());

    let res = app.oneshot(form_request("/quote", "symbol=msft", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains("MSFT Inc. (MSFT)"));
    assert!(body.contains("$250.00"));
}

#[tokio::test]
async fn post_quote_unknown_symbol_renders_apology() {
    let app = trade_app(test_state());

    let res = app.oneshot(form_request("/quote", "symbol=NOPE", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_body_string(res).await;
    assert!(body.contains("Quote unavailable for NOPE"));
}
