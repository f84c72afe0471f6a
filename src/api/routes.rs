//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Auth endpoints
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
        .route("/auth/verify", get(handlers::verify))
        // Crystal catalog
        .route("/crystals", get(handlers::list_crystals))
        .route("/crystals/search", get(handlers::search_crystals))
        .route("/crystals/stats", get(handlers::crystal_stats))
        .route("/crystals/element/:element", get(handlers::crystals_by_element))
        .route(
            "/crystals/healing/:property",
            get(handlers::crystals_by_healing_property),
        )
        .route("/crystals/:id", get(handlers::get_crystal))
        // Predictions
        .route(
            "/predictions",
            post(handlers::create_prediction).get(handlers::list_predictions),
        )
        .route("/predictions/:id", get(handlers::get_prediction))
        // Payments
        .route(
            "/payments",
            post(handlers::create_payment).get(handlers::list_payments),
        )
        .route("/payments/mock-success", post(handlers::mock_payment_success))
        .route("/payments/alipay/notify", post(handlers::alipay_notify))
        .route("/payments/:id", get(handlers::get_payment))
        .with_state(state)
}
