//! Serve a [`Router`] over HTTP/1.1.

use crate::response::{HttpResponse, bad_request};
use crate::router::Router;
use http::Request;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("invalid bind address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Buffer the body and hand the request to the router.
async fn handle_incoming(router: Arc<Router>, req: Request<Incoming>) -> HttpResponse {
    let (parts, body) = req.into_parts();
    match body.collect().await {
        Ok(collected) => {
            let req = Request::from_parts(parts, collected.to_bytes());
            router.handle(req).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            bad_request("unreadable request body")
        }
    }
}

impl Router {
    /// Accept connections on `addr` until the listener fails.
    pub async fn serve(self, addr: &str) -> Result<(), HttpError> {
        let addr: SocketAddr = addr.parse().map_err(|source| HttpError::InvalidAddress {
            addr: addr.to_string(),
            source,
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Trellis HTTP listening on http://{}", addr);
        self.serve_on(listener).await
    }

    /// Like [`Router::serve`] on an already bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), HttpError> {
        let router = Arc::new(self);

        loop {
            let (stream, peer) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = router.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let router = router.clone();
                    async move { Ok::<_, Infallible>(handle_incoming(router, req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!(%peer, "Error serving connection: {:?}", err);
                }
            });
        }
    }
}
