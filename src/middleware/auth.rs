use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{models::CurrentUser, AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user id as hex string
    pub sub: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for part in raw.split(';') {
        let Some((k, v)) = part.trim().split_once('=') else {
            continue;
        };
        if k.trim() == name {
            return Some(v.trim().to_string());
        }
    }
    None
}

/// Resolves the session cookie to a user id, if the token is valid.
pub fn session_user_id(state: &AppState, headers: &HeaderMap) -> Option<ObjectId> {
    let token = get_cookie(headers, state.settings.jwt_cookie_name.as_str())?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.settings.jwt_secret.as_bytes()),
        &validation,
    )
    .ok()?;

    ObjectId::parse_str(&data.claims.sub).ok()
}

pub async fn inject_current_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(user_id) = session_user_id(&state, req.headers()) {
        match state.ledger.find_user(user_id).await {
            Ok(Some(user)) => {
                // Store user in request extensions so handlers can access it
                req.extensions_mut().insert(CurrentUser::from(user));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(%user_id, error = %e, "could not load session user"),
        }
    }

    next.run(req).await
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn is_public_path(path: &str) -> bool {
    path == "/login"
        || path == "/register"
        || path == "/logout"
        || path == "/health"
        || path == "/health/db"
        || path == "/favicon.ico"
        || path.starts_with("/static/")
}

pub async fn require_auth(
    State(_state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if is_public_path(path) {
        return next.run(req).await;
    }

    // If inject_current_user already put CurrentUser in extensions => authenticated
    if req.extensions().get::<CurrentUser>().is_some() {
        return next.run(req).await;
    }

    // Not logged in:
    // - HTMX: force full redirect to /login
    // - Normal: redirect to /login
    if is_htmx(req.headers()) {
        let mut headers = HeaderMap::new();
        headers.insert("HX-Redirect", HeaderValue::from_static("/login"));
        return (StatusCode::OK, headers, Html("".to_string())).into_response();
    }

    Redirect::to("/login").into_response()
}
