use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::user_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/me", get(user_controller::me))
        .route(
            "/password",
            get(user_controller::get_password).post(user_controller::post_password),
        )
        .route("/add_cash", post(user_controller::post_add_cash))
}
