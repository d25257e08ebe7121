pub mod auth;
pub mod database;
pub mod errors;
pub mod services;
