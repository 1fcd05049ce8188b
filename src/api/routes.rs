use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{auth, handlers};
use crate::cli::RateDeskApp;

pub fn router(app: RateDeskApp) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Everything under /api needs the x-api-key header
    let api = Router::new()
        .route("/api/authenticate", post(handlers::authenticate))
        .route("/api/loads", get(handlers::get_loads))
        .route("/api/negotiate", post(handlers::negotiate))
        .route("/api/call/result", post(handlers::call_result))
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/ledger/verify", get(handlers::verify_ledger))
        .route_layer(middleware::from_fn_with_state(
            app.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::health))
        .route("/dashboard/data", get(handlers::dashboard_data))
        .merge(api)
        .with_state(app)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
