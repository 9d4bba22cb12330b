pub mod home_controller;
pub mod auth_controller;
pub mod user_controller;
pub mod trading_controller;
pub mod portfolio_controller;
