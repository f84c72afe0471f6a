pub mod api;
pub mod auth;
pub mod bazi;
pub mod config;
pub mod database;
pub mod errors;
pub mod logging;
pub mod models;
pub mod narrative;
pub mod payment;
pub mod prediction;
pub mod recommend;

pub use config::AppConfig;
pub use errors::*;
