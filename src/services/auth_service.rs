use std::collections::HashMap;

use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::oid::ObjectId;

use crate::{
    error::AccountError,
    models::{user::DEFAULT_CASH, User},
    AppState,
};

pub type FieldErrors = HashMap<String, String>;

fn form_error(msg: &str) -> FieldErrors {
    let mut errs = FieldErrors::new();
    errs.insert("_form".into(), msg.into());
    errs
}

#[derive(serde::Serialize)]
struct Claims {
    sub: String,
    exp: usize,
}

pub fn make_jwt_with_days(state: &AppState, user_id: &ObjectId, days: i64) -> Result<String, String> {
    let exp = (Utc::now() + Duration::days(days)).timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_hex(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn auth_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.settings.jwt_cookie_name.clone(), token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    if state.settings.cookie_secure {
        cookie.set_secure(true);
    }
    cookie
}

pub fn clear_auth_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.settings.jwt_cookie_name.clone(), "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.make_removal();
    cookie
}

pub async fn login_user(state: &AppState, username: &str, password: &str) -> Result<User, FieldErrors> {
    let user = match state.ledger.find_user_by_username(username).await {
        Ok(Some(u)) => u,
        Ok(None) => return Err(form_error("Invalid username and/or password.")),
        Err(e) => {
            tracing::error!(error = %e, "login lookup failed");
            return Err(form_error("Server error. Please try again."));
        }
    };

    if !verify(password, &user.hash).unwrap_or(false) {
        return Err(form_error("Invalid username and/or password."));
    }

    Ok(user)
}

pub async fn register_user(state: &AppState, username: &str, password: &str) -> Result<User, FieldErrors> {
    let mut errs: FieldErrors = HashMap::new();

    // unique username
    match state.ledger.find_user_by_username(username).await {
        Ok(Some(_)) => {
            errs.insert("username".into(), "Username has already been taken!".into());
            return Err(errs);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %e, "register lookup failed");
            return Err(form_error("There is a problem registering this user!"));
        }
    }

    let pw_hash = match hash(password, DEFAULT_COST) {
        Ok(h) => h,
        Err(_) => return Err(form_error("There is a problem registering this user!")),
    };

    match state.ledger.create_user(username, &pw_hash, DEFAULT_CASH).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, %username, "user registered");
            Ok(user)
        }
        // lost a race with a concurrent registration
        Err(AccountError::UsernameTaken) => {
            errs.insert("username".into(), "Username has already been taken!".into());
            Err(errs)
        }
        Err(e) => {
            tracing::error!(error = %e, "register insert failed");
            Err(form_error("There is a problem registering this user!"))
        }
    }
}
