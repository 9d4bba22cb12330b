use std::str::FromStr;

use axum::{
    Form,
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState,
    models::CurrentUser,
    render::{self, usd, Flash},
    services::user_service,
};

pub async fn me(user: Option<Extension<CurrentUser>>) -> impl IntoResponse {
    match user {
        Some(Extension(u)) => (StatusCode::OK, axum::Json(u)).into_response(),
        None => (StatusCode::UNAUTHORIZED, Html("not logged in".to_string())).into_response(),
    }
}

// ---------------- Password ----------------

#[derive(Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

fn password_page(state: &AppState, user: Option<&CurrentUser>, errors: serde_json::Map<String, serde_json::Value>) -> Response {
    render::page(
        state,
        StatusCode::OK,
        "Change Password",
        "pages/password",
        &json!({ "errors": errors }),
        user,
        None,
    )
}

// GET /password
pub async fn get_password(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    password_page(&state, user_ref, serde_json::Map::new())
}

// POST /password
pub async fn post_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let mut errors = serde_json::Map::new();

    let Some(Extension(u)) = user else {
        errors.insert("_form".into(), json!("There was an error getting user"));
        return password_page(&state, None, errors);
    };

    if form.old_password.is_empty() {
        errors.insert("old_password".into(), json!("Current password is required."));
    }
    if form.new_password.is_empty() {
        errors.insert("new_password".into(), json!("New password is required."));
    }
    if form.confirm_password.is_empty() {
        errors.insert("confirm_password".into(), json!("Repeat password is required."));
    }
    if errors.is_empty() && form.new_password != form.confirm_password {
        errors.insert("confirm_password".into(), json!("Passwords do not match."));
    }
    if errors.is_empty() && form.new_password.len() < 6 {
        errors.insert(
            "new_password".into(),
            json!("Password must be at least 6 characters."),
        );
    }

    if errors.is_empty() {
        if let Err(errs) =
            user_service::change_password(&state, u.id, &form.old_password, &form.new_password).await
        {
            for (k, v) in errs {
                errors.insert(k, json!(v));
            }
        }
    }

    if !errors.is_empty() {
        return password_page(&state, Some(&u), errors);
    }

    let jar = render::set_flash(jar, Flash::success("Password changed successfully!"));
    (jar, render::redirect(&headers, "/")).into_response()
}

// ---------------- Funds ----------------

#[derive(Deserialize)]
pub struct DepositForm {
    #[serde(default)]
    pub amount: String,
}

// POST /add_cash
pub async fn post_add_cash(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<DepositForm>,
) -> Response {
    let Some(Extension(u)) = user else {
        let jar = render::set_flash(jar, Flash::error("There was an error getting user"));
        return (jar, render::redirect(&headers, "/")).into_response();
    };

    let amount_str = form.amount.trim();
    let flash = if amount_str.is_empty() {
        Flash::error("Amount is required")
    } else {
        match Decimal::from_str(amount_str) {
            Err(_) => Flash::error("Invalid amount"),
            Ok(amount) => match state.accounts.deposit(u.id, amount).await {
                Ok(_) => Flash::success(format!("Successfully added {} to your account!", usd(amount))),
                Err(e) => {
                    tracing::warn!(user_id = %u.id, error = %e, "deposit rejected");
                    Flash::error(e.to_string())
                }
            },
        }
    };

    let jar = render::set_flash(jar, flash);
    (jar, render::redirect(&headers, "/")).into_response()
}
