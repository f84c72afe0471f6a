//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::database::Database;
use crate::narrative::NarrativeService;
use crate::payment::AlipayClient;
use crate::prediction::PredictionService;
use crate::Result;

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("🚀 Starting CrystalPath API server...");

    // Initialize services
    let database = Arc::new(Database::from_config(config).await?);
    database.init_schema().await?;

    let auth = Arc::new(AuthService::new(config));
    let payment = Arc::new(AlipayClient::new(&config.alipay)?);
    let narrative = Arc::new(NarrativeService::new(config)?);
    let prediction = Arc::new(PredictionService::new(database.clone(), narrative));

    let state = AppState {
        database,
        auth,
        payment,
        prediction,
        config: Arc::new(config.clone()),
    };

    // Build API routes
    let api_router = routes::api_routes(state);

    let mut app = Router::new().nest("/api", api_router);

    // Add middleware layers
    app = app
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    // Add CORS if enabled
    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Start server
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{addr}");
    info!("📋 RESTful API available at http://{addr}/api");
    info!("");
    info!("Available endpoints:");
    info!("  GET  /api/health                  - Health check");
    info!("  POST /api/auth/register           - Register");
    info!("  POST /api/auth/login              - Log in");
    info!("  GET  /api/auth/me                 - Current user");
    info!("  GET  /api/crystals                - Crystal catalog");
    info!("  GET  /api/crystals/search?q=      - Search crystals");
    info!("  POST /api/predictions             - Create prediction");
    info!("  GET  /api/predictions             - Prediction history");
    info!("  POST /api/payments                - Create payment order");
    info!("  POST /api/payments/alipay/notify  - Gateway webhook");

    axum::serve(listener, app).await?;

    Ok(())
}
