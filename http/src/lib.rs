//! # trellis-http
//!
//! A small ordered-layer-stack router. It is what the legacy application is
//! built on, and it publishes its stack through
//! [`trellis_core::Introspect`] so characterization tests can snapshot it.

pub mod middleware;
pub mod response;
pub mod router;
pub mod server;

pub use middleware::{
    Flow, HttpRequest, JsonBody, JsonPayload, Middleware, REQUEST_ID_HEADER, RequestId,
    ensure_request_id,
};
pub use response::{HttpResponse, bad_request, json, not_found, text};
pub use router::{Route, Router};
pub use server::HttpError;

pub mod prelude {
    pub use crate::middleware::{Flow, HttpRequest, JsonBody, JsonPayload, Middleware, RequestId};
    pub use crate::response::{HttpResponse, bad_request, json, not_found, text};
    pub use crate::router::{Route, Router};

    // Re-export common types users will need
    pub use bytes::Bytes;
    pub use http::{Method, Request, Response, StatusCode};
}
