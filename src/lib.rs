pub mod aggregate;
pub mod app;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod insights;
pub mod locate;
pub mod models;
pub mod npm_api;
pub mod social;
pub mod state;
pub mod suggestions;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
