use axum::{
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{error::AccountError, models::CurrentUser, AppState};

const FLASH_COOKIE: &str = "flash";

/// One-shot message shown on the next full page render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: String,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: "success".into(), message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: "danger".into(), message: message.into() }
    }
}

pub fn set_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    let value = serde_json::to_string(&flash).unwrap_or_default();
    let mut cookie = Cookie::new(FLASH_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Reads and clears the pending flash message, if any.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(raw) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let flash = serde_json::from_str::<Flash>(&raw).ok();
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// 303 to `path`, or an `HX-Redirect` for HTMX requests.
pub fn redirect(headers: &HeaderMap, path: &str) -> Response {
    if is_htmx(headers) {
        let mut out = HeaderMap::new();
        if let Ok(v) = path.parse() {
            out.insert("HX-Redirect", v);
        }
        return (StatusCode::OK, out, Html(String::new())).into_response();
    }
    (StatusCode::SEE_OTHER, [("Location", path.to_string())], Html(String::new())).into_response()
}

/// Formats a money amount as `$1,234.56`.
pub fn usd(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let neg = rounded.is_sign_negative() && !rounded.is_zero();
    let s = format!("{:.2}", rounded.abs());
    let (int_part, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", if neg { "-" } else { "" }, grouped, frac)
}

/// Unix millis as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

pub fn render_full(
    state: &AppState,
    title: &str,
    body_html: String,
    user: Option<&CurrentUser>,
    flash: Option<&Flash>,
) -> Result<String, String> {
    let (is_logged_in, user_json) = match user {
        Some(u) => (
            true,
            json!({
                "id": u.id.to_hex(),
                "username": u.username,
            }),
        ),
        None => (false, serde_json::Value::Null),
    };

    let ctx = json!({
        "title": title,
        "body": body_html,
        "is_logged_in": is_logged_in,
        "user": user_json,
        "flash": flash,
    });

    state
        .hbs
        .render("layouts/base", &ctx)
        .map_err(|e| e.to_string())
}

/// Renders `tpl` with `ctx` inside the base layout.
pub fn page(
    state: &AppState,
    status: StatusCode,
    title: &str,
    tpl: &str,
    ctx: &serde_json::Value,
    user: Option<&CurrentUser>,
    flash: Option<&Flash>,
) -> Response {
    let body = match state.hbs.render(tpl, ctx) {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("template error: {e}")),
            )
                .into_response()
        }
    };

    match render_full(state, title, body, user, flash) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(e)).into_response(),
    }
}

/// Error page carrying the status code and a human-readable message.
pub fn apology(state: &AppState, status: StatusCode, message: &str, user: Option<&CurrentUser>) -> Response {
    page(
        state,
        status,
        "Apology",
        "pages/apology",
        &json!({ "code": status.as_u16(), "message": message }),
        user,
        None,
    )
}

pub fn account_error(state: &AppState, err: &AccountError, user: Option<&CurrentUser>) -> Response {
    apology(state, err.status(), &err.to_string(), user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_groups_thousands() {
        assert_eq!(usd(Decimal::new(1_000_000, 2)), "$10,000.00");
        assert_eq!(usd(Decimal::new(123_456_789, 2)), "$1,234,567.89");
        assert_eq!(usd(Decimal::new(5, 1)), "$0.50");
        assert_eq!(usd(Decimal::new(-1_999, 0)), "-$1,999.00");
    }

    #[test]
    fn usd_rounds_half_up() {
        assert_eq!(usd(Decimal::new(12_345, 3)), "$12.35");
    }
}
