//! # Router - Ordered Layer Stack
//!
//! `Router` is a flat builder over an ordered stack of layers:
//!
//! - `route(method, path, handler)` / `route_with(Route)` - terminal routes
//! - `layer(middleware)` / `layer_fn(closure)` - pipeline steps
//! - `nest(prefix, router)` - mounted sub-routers, to any depth
//! - `fallback(handler)` - answer for unmatched requests
//!
//! Requests walk the stack in registration order and the first matching
//! route wins. The same order is published through [`Introspect`] so it can
//! be snapshotted.

use crate::middleware::{
    Flow, FnMiddleware, HttpRequest, Middleware, REQUEST_ID_HEADER, ensure_request_id,
};
use crate::response::{HttpResponse, not_found};
use http::Method;
use http::header::HeaderValue;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;
use tracing::Instrument;
use trellis_core::{CharacterizeResult, Introspect, LayerInfo};

/// Type alias for async boxed futures used by handlers and dispatch.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Route handler type: boxed async function returning a Response
pub type Handler = Arc<dyn Fn(HttpRequest) -> BoxFuture<'static, HttpResponse> + Send + Sync>;

/// Layer name reported for route layers.
pub const ROUTE_LAYER: &str = "route";
/// Layer name reported for mounted sub-routers.
pub const ROUTER_LAYER: &str = "router";

fn boxed_handler<H, Fut>(handler: H) -> Handler
where
    H: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    Arc::new(move |req| Box::pin(handler(req)) as BoxFuture<'static, HttpResponse>)
}

/// A single path answering one or more methods.
///
/// ```rust,ignore
/// let ping = Route::new("/ping")
///     .on(Method::GET, |_req| async { text("pong") })
///     .on(Method::HEAD, |_req| async { text("") });
/// ```
#[derive(Clone)]
pub struct Route {
    path: String,
    handlers: Vec<(Method, Handler)>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handlers: Vec::new(),
        }
    }

    /// Bind `method` on this path. A method bound twice keeps its first
    /// position and its first handler.
    pub fn on<H, Fut>(mut self, method: Method, handler: H) -> Self
    where
        H: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        if self.handlers.iter().any(|(m, _)| *m == method) {
            tracing::warn!(path = %self.path, %method, "Method already bound on route; ignoring");
            return self;
        }
        self.handlers.push((method, boxed_handler(handler)));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Lowercase method names in registration order.
    pub fn methods(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|(m, _)| m.as_str().to_ascii_lowercase())
            .collect()
    }

    fn handler_for(&self, method: &Method) -> Option<&Handler> {
        self.handlers
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, h)| h)
    }
}

#[derive(Clone)]
enum Layer {
    Route(Route),
    Router { prefix: String, router: Arc<Router> },
    Middleware(Arc<dyn Middleware>),
}

impl Layer {
    fn info(&self) -> LayerInfo {
        match self {
            Layer::Route(route) => {
                LayerInfo::route(Some(ROUTE_LAYER.to_string()), route.path(), route.methods())
            }
            Layer::Router { prefix, router } => LayerInfo::router(
                Some(ROUTER_LAYER.to_string()),
                prefix.clone(),
                router.layers.iter().map(Layer::info).collect(),
            ),
            Layer::Middleware(mw) => LayerInfo::middleware(mw.name().map(str::to_string)),
        }
    }
}

enum Dispatch {
    Handled(HttpResponse),
    Unmatched(HttpRequest),
}

/// HTTP Router with an ordered, introspectable layer stack.
#[derive(Clone, Default)]
pub struct Router {
    layers: Vec<Layer>,
    /// Only consulted on the outermost router.
    fallback: Option<Handler>,
}

impl Router {
    /// Create a new empty Router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route for a single method.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// Router::new()
    ///     .route(Method::POST, "/product", create_product)
    /// ```
    pub fn route<H, Fut>(self, method: Method, path: impl Into<String>, handler: H) -> Self
    where
        H: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        self.route_with(Route::new(path).on(method, handler))
    }

    /// Register a multi-method route as a single layer.
    pub fn route_with(mut self, route: Route) -> Self {
        self.layers.push(Layer::Route(route));
        self
    }

    /// Register a middleware layer.
    pub fn layer<M: Middleware>(mut self, middleware: M) -> Self {
        self.layers.push(Layer::Middleware(Arc::new(middleware)));
        self
    }

    /// Register an unnamed closure middleware.
    pub fn layer_fn<F>(self, f: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Flow + Send + Sync + 'static,
    {
        self.layer(FnMiddleware::new(f))
    }

    /// Mount `router` under `prefix`.
    ///
    /// A trailing `/` on the prefix is dropped, so `"/"` and `""` both mount
    /// at the root. A nested router's fallback is never used.
    pub fn nest(mut self, prefix: impl Into<String>, router: Router) -> Self {
        let prefix: String = prefix.into();
        let prefix = prefix.trim_end_matches('/').to_string();
        self.layers.push(Layer::Router {
            prefix,
            router: Arc::new(router),
        });
        self
    }

    /// Set a fallback handler for unmatched requests.
    ///
    /// Without one, unmatched requests get a plain 404.
    pub fn fallback<H, Fut>(mut self, handler: H) -> Self
    where
        H: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        self.fallback = Some(boxed_handler(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run a request through the stack.
    ///
    /// The request id is settled before anything runs, so the span, every
    /// layer and the `x-request-id` echoed on the response all agree.
    pub async fn handle(&self, mut req: HttpRequest) -> HttpResponse {
        let request_id = ensure_request_id(&mut req);
        let span = tracing::info_span!(
            "HTTPRequest",
            trellis.http.method = %req.method(),
            trellis.http.path = %req.uri().path(),
            trellis.http.request_id = %request_id
        );

        async move {
            let path = req.uri().path().to_string();
            let mut res = match dispatch(&self.layers, req, path).await {
                Dispatch::Handled(res) => {
                    tracing::debug!(status = %res.status(), "Request handled");
                    res
                }
                Dispatch::Unmatched(req) => match &self.fallback {
                    Some(fb) => fb(req).await,
                    None => {
                        tracing::debug!("No route matched");
                        not_found()
                    }
                },
            };
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .entry(REQUEST_ID_HEADER.clone())
                    .or_insert(value);
            }
            res
        }
        .instrument(span)
        .await
    }
}

/// Remainder of `path` below a mount `prefix`, if the prefix matches on a
/// segment boundary.
fn strip_mount<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

fn dispatch(layers: &[Layer], mut req: HttpRequest, path: String) -> BoxFuture<'_, Dispatch> {
    Box::pin(async move {
        for layer in layers {
            match layer {
                Layer::Middleware(mw) => {
                    if let Flow::Respond(res) = mw.handle(&mut req).await {
                        tracing::debug!(
                            middleware = mw.name().unwrap_or(trellis_core::ANONYMOUS),
                            "Middleware answered request"
                        );
                        return Dispatch::Handled(res);
                    }
                }
                Layer::Route(route) => {
                    if route.path() != path {
                        continue;
                    }
                    if let Some(handler) = route.handler_for(req.method()) {
                        let handler = handler.clone();
                        return Dispatch::Handled(handler(req).await);
                    }
                }
                Layer::Router { prefix, router } => {
                    let Some(rest) = strip_mount(prefix, &path) else {
                        continue;
                    };
                    match dispatch(&router.layers, req, rest.to_string()).await {
                        Dispatch::Handled(res) => return Dispatch::Handled(res),
                        Dispatch::Unmatched(back) => req = back,
                    }
                }
            }
        }
        Dispatch::Unmatched(req)
    })
}

impl Introspect for Router {
    fn layer_stack(&self) -> CharacterizeResult<Vec<LayerInfo>> {
        Ok(self.layers.iter().map(Layer::info).collect())
    }
}

/// In-process dispatch, e.g. `router.oneshot(req)` from tests.
impl Service<HttpRequest> for Router {
    type Response = HttpResponse;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let router = self.clone();
        Box::pin(async move { Ok(router.handle(req).await) })
    }
}
