mod common;

use axum::http::{header, Request, StatusCode};
use common::{response_body_string, seed_user, test_state};
use papertrade::{routes, services::auth_service};
use tower::ServiceExt;

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder().uri(uri).body(axum::body::Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let res = routes::app(test_state()).oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = routes::app(test_state()).oneshot(get("/health/db")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_body_string(res).await, "ledger: ok");
}

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    for uri in ["/", "/buy", "/sell", "/quote", "/history", "/password"] {
        let res = routes::app(test_state()).oneshot(get(uri)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");
    }
}

#[tokio::test]
async fn responses_are_not_cached() {
    let res = routes::app(test_state()).oneshot(get("/login")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(res.headers().get(header::PRAGMA).unwrap(), "no-cache");
}

#[tokio::test]
async fn session_cookie_unlocks_portfolio_and_history() {
    let state = test_state();
    let user = seed_user(&state, "alice", 10_000).await;
    state.accounts.buy(user.id, "AAPL", 3).await.unwrap();

    let token = auth_service::make_jwt_with_days(&state, &user.id, 1).unwrap();
    let cookie = format!("auth={token}");

    let mut req = get("/");
    req.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
    let res = routes::app(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains("alice"));
    assert!(body.contains("AAPL Inc."));
    assert!(body.contains("$9,700.00"));
    assert!(body.contains(r#"<td class="border-0 fw-bold text-end" colspan="4">Cash</td>"#));
    assert!(!body.contains("ffw-bold"));

    let mut req = get("/history");
    req.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
    let res = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains(">Buy<"));
    assert!(body.contains("$300.00"));
}

#[tokio::test]
async fn unknown_path_for_signed_in_user_is_404() {
    let state = test_state();
    let user = seed_user(&state, "alice", 10_000).await;
    let token = auth_service::make_jwt_with_days(&state, &user.id, 1).unwrap();

    let mut req = get("/nowhere");
    req.headers_mut().insert(header::COOKIE, format!("auth={token}").parse().unwrap());

    let res = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
