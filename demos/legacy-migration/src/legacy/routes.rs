use super::service::ProductService;
use std::sync::Arc;
use trellis_http::prelude::*;

/// `input` field of a JSON body, if it is a string.
fn input_of(req: &HttpRequest) -> Option<String> {
    req.extensions()
        .get::<JsonPayload>()
        .and_then(|payload| payload.0.get("input"))
        .and_then(|input| input.as_str())
        .map(str::to_string)
}

pub fn product_routes(service: Arc<dyn ProductService>) -> Router {
    let list = service.clone();
    let create = service.clone();
    let update = service;

    Router::new()
        .route(Method::GET, "/products", move |_req| {
            let service = list.clone();
            async move { json(&service.get_products()) }
        })
        .route(Method::POST, "/product", move |req| {
            let service = create.clone();
            async move { json(&service.create_product(input_of(&req).as_deref())) }
        })
        .route(Method::PUT, "/product", move |req| {
            let service = update.clone();
            async move { json(&service.update_product(input_of(&req).as_deref())) }
        })
}
