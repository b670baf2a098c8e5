use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/package/*name", get(handlers::package_page))
        .route("/api/insights", get(handlers::all_insights))
        .route("/api/insights/*name", get(handlers::package_insights))
        .route("/api/suggestions", get(handlers::suggestions))
        .route("/api/package/og-image/*name", get(handlers::og_image))
        .route("/api/package/readme-image/*name", get(handlers::readme_image))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
