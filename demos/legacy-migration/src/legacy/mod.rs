//! The legacy product API, frozen. Its bytes are fingerprinted by the
//! characterization suite: touching anything in this directory means
//! re-approving the baselines.

pub mod routes;
pub mod service;

use std::sync::Arc;
use trellis_http::prelude::*;

pub use routes::product_routes;
pub use service::{LegacyProductService, ProductReply, ProductService};

pub fn legacy_app() -> Router {
    legacy_app_with(Arc::new(LegacyProductService::default()))
}

pub fn legacy_app_with(service: Arc<dyn ProductService>) -> Router {
    Router::new()
        .layer(RequestId)
        .layer(JsonBody)
        .layer_fn(|req| {
            tracing::info!(method = %req.method(), path = %req.uri().path(), "legacy request");
            Flow::Next
        })
        .nest("/api", product_routes(service))
}
