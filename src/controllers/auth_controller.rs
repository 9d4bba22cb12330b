use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::User,
    render::{self, Flash},
    services::auth_service,
    AppState,
};

fn form_page(state: &AppState, title: &str, tpl: &str, ctx: serde_json::Value) -> Response {
    render::page(state, StatusCode::OK, title, tpl, &ctx, None, None)
}

/// Issues the session cookie and sends the browser home.
fn start_session(state: &AppState, headers: &HeaderMap, jar: CookieJar, user: &User, flash: Option<Flash>) -> Response {
    let token = match auth_service::make_jwt_with_days(state, &user.id, 7) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "could not sign session token");
            return render::apology(state, StatusCode::INTERNAL_SERVER_ERROR, "Could not start a session.", None);
        }
    };

    let mut jar = jar.add(auth_service::auth_cookie(state, token));
    if let Some(f) = flash {
        jar = render::set_flash(jar, f);
    }

    (jar, render::redirect(headers, "/")).into_response()
}

// ---------------- LOGIN ----------------

pub async fn get_login(State(state): State<AppState>, jar: CookieJar) -> Response {
    // visiting the login form forgets any current session
    let jar = jar.add(auth_service::clear_auth_cookie(&state));
    (jar, form_page(&state, "Log In", "pages/login", json!({}))).into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn post_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim().to_string();
    let password = form.password;

    let mut errors = serde_json::Map::new();

    if username.is_empty() {
        errors.insert("username".into(), json!("Username is required."));
    }
    if password.is_empty() {
        errors.insert("password".into(), json!("Password is required."));
    }

    if !errors.is_empty() {
        return form_page(
            &state,
            "Log In",
            "pages/login",
            json!({ "values": { "username": username }, "errors": errors }),
        );
    }

    let user = match auth_service::login_user(&state, &username, &password).await {
        Ok(u) => u,
        Err(errs) => {
            for (k, v) in errs {
                errors.insert(k, json!(v));
            }
            return form_page(
                &state,
                "Log In",
                "pages/login",
                json!({ "values": { "username": username }, "errors": errors }),
            );
        }
    };

    start_session(&state, &headers, jar, &user, None)
}

// ---------------- REGISTER ----------------

pub async fn get_register(State(state): State<AppState>) -> Response {
    form_page(&state, "Register", "pages/register", json!({}))
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

pub async fn post_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let username = form.username.trim().to_string();
    let password = form.password;
    let confirmation = form.confirmation;

    let mut errors = serde_json::Map::new();

    if username.is_empty() {
        errors.insert("username".into(), json!("Username is required."));
    } else if username.chars().count() < 2 || username.chars().count() > 64 {
        errors.insert("username".into(), json!("Username must be 2 to 64 characters."));
    }

    if password.is_empty() {
        errors.insert("password".into(), json!("Password is required."));
    } else if password.len() < 6 {
        errors.insert("password".into(), json!("Password must be at least 6 characters."));
    }

    if confirmation.is_empty() {
        errors.insert("confirmation".into(), json!("Password confirmation is required."));
    } else if password != confirmation {
        errors.insert("confirmation".into(), json!("Passwords do not match."));
    }

    if !errors.is_empty() {
        return form_page(
            &state,
            "Register",
            "pages/register",
            json!({ "values": { "username": username }, "errors": errors }),
        );
    }

    let user = match auth_service::register_user(&state, &username, &password).await {
        Ok(u) => u,
        Err(errs) => {
            for (k, v) in errs {
                errors.insert(k, json!(v));
            }
            return form_page(
                &state,
                "Register",
                "pages/register",
                json!({ "values": { "username": username }, "errors": errors }),
            );
        }
    };

    start_session(&state, &headers, jar, &user, Some(Flash::success("Registration successful! Welcome!")))
}

// ---------------- LOGOUT ----------------

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(auth_service::clear_auth_cookie(&state));
    (jar, (StatusCode::SEE_OTHER, [("Location", "/")]))
}
