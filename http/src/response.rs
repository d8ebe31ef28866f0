use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

pub type HttpResponse = Response<Full<Bytes>>;

fn with_content_type(body: impl Into<Bytes>, content_type: &'static str) -> HttpResponse {
    let mut res = Response::new(Full::new(body.into()));
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    res
}

/// Create a text/plain response
pub fn text(body: impl Into<Bytes>) -> HttpResponse {
    with_content_type(body, "text/plain; charset=utf-8")
}

/// Create a JSON response.
///
/// A value that fails to serialize becomes a 500 instead of a panic.
pub fn json<T: Serialize>(body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_content_type(bytes, "application/json"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize JSON response");
            with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                text("Internal Server Error"),
            )
        }
    }
}

/// Create a 404 Not Found response
pub fn not_found() -> HttpResponse {
    with_status(StatusCode::NOT_FOUND, text("Not Found"))
}

/// Create a 400 response with a JSON `{ "error": ... }` body
pub fn bad_request(reason: impl Into<String>) -> HttpResponse {
    with_status(
        StatusCode::BAD_REQUEST,
        json(&serde_json::json!({ "error": reason.into() })),
    )
}

pub fn with_status(status: StatusCode, mut res: HttpResponse) -> HttpResponse {
    *res.status_mut() = status;
    res
}
