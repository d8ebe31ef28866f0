//! Middleware layers.
//!
//! A middleware sees the request before any later layer in the stack and
//! either lets it through or answers it.

use crate::response::{HttpResponse, bad_request};
use async_trait::async_trait;
use bytes::Bytes;
use http::Request;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};

pub type HttpRequest = Request<Bytes>;

/// What a middleware decided.
pub enum Flow {
    /// Hand the (possibly modified) request to the next layer.
    Next,
    /// Stop here and answer with this response.
    Respond(HttpResponse),
}

#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Identifier reported by introspection. `None` shows up as `anonymous`.
    fn name(&self) -> Option<&str> {
        None
    }

    async fn handle(&self, req: &mut HttpRequest) -> Flow;
}

/// Closure middleware registered through `Router::layer_fn`. Always unnamed.
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut HttpRequest) -> Flow + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut HttpRequest) -> Flow + Send + Sync + 'static,
{
    async fn handle(&self, req: &mut HttpRequest) -> Flow {
        (self.f)(req)
    }
}

/// Parsed JSON request body, stored in the request extensions by [`JsonBody`].
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPayload(pub serde_json::Value);

/// Parses `application/json` bodies into a [`JsonPayload`] extension.
///
/// Requests with another content type, or an empty body, pass through untouched.
/// Malformed JSON is answered with 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody;

#[async_trait]
impl Middleware for JsonBody {
    fn name(&self) -> Option<&str> {
        Some("json_body")
    }

    async fn handle(&self, req: &mut HttpRequest) -> Flow {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);

        if !is_json || req.body().is_empty() {
            return Flow::Next;
        }

        match serde_json::from_slice::<serde_json::Value>(req.body()) {
            Ok(value) => {
                req.extensions_mut().insert(JsonPayload(value));
                Flow::Next
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting malformed JSON body");
                Flow::Respond(bad_request(format!("malformed JSON body: {e}")))
            }
        }
    }
}

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// The request's `x-request-id`, stamped with a fresh UUIDv4 first if the
/// caller sent none.
pub fn ensure_request_id(req: &mut HttpRequest) -> String {
    if let Some(existing) = req.headers().get(&REQUEST_ID_HEADER) {
        return String::from_utf8_lossy(existing.as_bytes()).into_owned();
    }
    let id = uuid::Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        req.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    id
}

/// Stamps `x-request-id` with a fresh UUIDv4 unless the caller sent one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestId;

#[async_trait]
impl Middleware for RequestId {
    fn name(&self) -> Option<&str> {
        Some("request_id")
    }

    async fn handle(&self, req: &mut HttpRequest) -> Flow {
        ensure_request_id(req);
        Flow::Next
    }
}
