use bcrypt::verify;
use mongodb::bson::oid::ObjectId;

use crate::AppState;

use super::auth_service::FieldErrors;

/// Replaces the password hash after checking the current password.
pub async fn change_password(
    state: &AppState,
    user_id: ObjectId,
    old_password: &str,
    new_password: &str,
) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::new();

    let db_user = match state.ledger.find_user(user_id).await {
        Ok(Some(u)) => u,
        _ => {
            errs.insert("_form".into(), "User not found.".into());
            return Err(errs);
        }
    };

    if !verify(old_password, &db_user.hash).unwrap_or(false) {
        errs.insert("old_password".into(), "Incorrect password.".into());
        return Err(errs);
    }

    if verify(new_password, &db_user.hash).unwrap_or(false) {
        errs.insert(
            "new_password".into(),
            "New password must be different from your current password.".into(),
        );
        return Err(errs);
    }

    let pw_hash = match bcrypt::hash(new_password, bcrypt::DEFAULT_COST) {
        Ok(h) => h,
        Err(_) => {
            errs.insert("_form".into(), "Failed to hash password.".into());
            return Err(errs);
        }
    };

    if let Err(e) = state.ledger.set_password_hash(user_id, &pw_hash).await {
        errs.insert("_form".into(), format!("db error: {e}"));
        return Err(errs);
    }

    tracing::info!(%user_id, "password changed");
    Ok(())
}
