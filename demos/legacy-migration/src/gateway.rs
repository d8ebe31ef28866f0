//! The newer application.
//!
//! Routes are moved off the legacy router one at a time: a migrated route is
//! registered ahead of the legacy mount so it wins the match, and everything
//! not yet migrated falls through to the legacy app mounted at the root.

use crate::legacy::{self, LegacyProductService, ProductService};
use std::sync::Arc;
use trellis_http::prelude::*;

pub fn gateway_app() -> Router {
    gateway_app_with(Arc::new(LegacyProductService::default()))
}

pub fn gateway_app_with(service: Arc<dyn ProductService>) -> Router {
    Router::new()
        .layer(RequestId)
        .route(Method::GET, "/", |_req| async { text("Hello World!") })
        .route(Method::POST, "/cats", |_req| async {
            text("Cria novos gatos")
        })
        .route(Method::GET, "/cats", |_req| async {
            text("Retorna todos os gatos")
        })
        .nest("/api", migrated_routes(service.clone()))
        .nest("", legacy::legacy_app_with(service))
}

/// Product routes already served natively by the gateway.
pub fn migrated_routes(service: Arc<dyn ProductService>) -> Router {
    Router::new().route(Method::GET, "/products", move |_req| {
        let service = service.clone();
        async move { json(&service.get_products()) }
    })
}
