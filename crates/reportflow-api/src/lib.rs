/// Reportflow API - HTTP surface for the dispatch pipeline
///
/// Accepts report batches over JSON and answers with one result per item.
pub mod api;
pub mod context;
pub mod error;
pub mod middleware;

pub use context::ApiContext;
pub use error::ApiError;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the application router
pub fn router(ctx: Arc<ApiContext>) -> Router {
    let v1_router = Router::new()
        .route("/health", get(api::health::handler))
        .route("/reports", post(api::reports::dispatch))
        .route("/reports/tokens", post(api::reports::dispatch_tokens));

    Router::new()
        .nest("/v1", v1_router)
        .route_layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
