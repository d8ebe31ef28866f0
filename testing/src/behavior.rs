//! Behavior recording
//!
//! Replays probe requests through a router in-process and keeps what came
//! back, so response bodies can be snapshotted next to the route table.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower::ServiceExt;
use trellis_http::Router;

#[derive(Error, Debug)]
pub enum BehaviorError {
    #[error("probe {method} {path} is not a valid request: {source}")]
    InvalidProbe {
        method: String,
        path: String,
        #[source]
        source: http::Error,
    },
}

/// A request to replay.
#[derive(Debug, Clone)]
pub struct Probe {
    method: Method,
    path: String,
    body: Option<Value>,
}

impl Probe {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Send `body` as `application/json`.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn into_request(self) -> Result<Request<Bytes>, BehaviorError> {
        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(self.path.as_str());
        let body = match &self.body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Bytes::from(value.to_string())
            }
            None => Bytes::new(),
        };
        builder
            .body(body)
            .map_err(|source| BehaviorError::InvalidProbe {
                method: self.method.to_string(),
                path: self.path.clone(),
                source,
            })
    }
}

/// One recorded request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request: Option<Value>,
    pub status: u16,
    /// Parsed JSON when the body is JSON, the raw text otherwise.
    pub response: Value,
}

/// Dispatch every probe, in order, and record the exchanges.
pub async fn record(router: &Router, probes: Vec<Probe>) -> Result<Vec<Exchange>, BehaviorError> {
    let mut exchanges = Vec::with_capacity(probes.len());

    for probe in probes {
        let method = probe.method.as_str().to_string();
        let path = probe.path.clone();
        let request = probe.body.clone();

        let res = match router.clone().oneshot(probe.into_request()?).await {
            Ok(res) => res,
            Err(never) => match never {},
        };
        let status = res.status().as_u16();
        let bytes = match res.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let response = serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        tracing::debug!(%method, %path, status, "Recorded exchange");
        exchanges.push(Exchange {
            method,
            path,
            request,
            status,
            response,
        });
    }

    Ok(exchanges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_http::{JsonBody, JsonPayload, json as json_response, text};

    fn echo_router() -> Router {
        Router::new()
            .layer(JsonBody)
            .route(Method::GET, "/hello", |_| async { text("Hello World!") })
            .route(Method::POST, "/echo", |req| async move {
                let payload = req
                    .extensions()
                    .get::<JsonPayload>()
                    .map(|p| p.0.clone())
                    .unwrap_or(Value::Null);
                json_response(&json!({ "echo": payload }))
            })
    }

    #[tokio::test]
    async fn test_records_in_order_with_parsed_bodies() {
        let router = echo_router();
        let exchanges = record(
            &router,
            vec![
                Probe::get("/hello"),
                Probe::post("/echo").json(json!({ "input": "sim" })),
                Probe::get("/missing"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(exchanges.len(), 3);
        assert_eq!(exchanges[0].response, json!("Hello World!"));
        assert_eq!(exchanges[1].method, "POST");
        assert_eq!(exchanges[1].request, Some(json!({ "input": "sim" })));
        assert_eq!(exchanges[1].response, json!({ "echo": { "input": "sim" } }));
        assert_eq!(exchanges[2].status, 404);
    }

    #[tokio::test]
    async fn test_invalid_probe_path_is_an_error() {
        let err = record(&echo_router(), vec![Probe::get("not a uri")])
            .await
            .unwrap_err();
        assert!(matches!(err, BehaviorError::InvalidProbe { .. }));
    }

    #[test]
    fn test_exchange_serialization_omits_empty_request() {
        let exchange = Exchange {
            method: "GET".into(),
            path: "/hello".into(),
            request: None,
            status: 200,
            response: json!("Hello World!"),
        };
        let value = serde_json::to_value(&exchange).unwrap();
        assert!(value.get("request").is_none());
    }
}
