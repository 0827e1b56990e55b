use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tierds_remote::BlockStore;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router serving the block API over `store`.
pub fn build_router(store: Arc<dyn BlockStore>) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route(
            "/v1/block/:cid",
            get(handler::get_block).head(handler::head_block),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}
