//! Request routing — map HTTP methods and exact paths to handler functions.
//!
//! This application exposes a small fixed route table, so the router matches
//! on method plus literal path only. Trailing slashes are normalized on both
//! registered paths and incoming requests, so `/api/generateCode/` and
//! `/api/generateCode` are treated as equivalent.
//!
//! Routes are matched in registration order; the first route whose method and
//! path both match the incoming request wins. When no route matches, a
//! `404 Not Found` response is returned.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{Method, Request, Response, StatusCode};

/// Type-erased, heap-allocated async handler that processes a [`Request`] and
/// returns a [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be cloned and shared
/// across threads without copying the underlying closure. In practice you never
/// construct this type directly — use [`Router::get`] and [`Router::post`].
pub type Handler =
    Arc<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Request) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait automatically via the blanket
/// impl below.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given request, boxing the returned future.
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(request))
    }
}

// A single registered route binding a method + path to a handler.
struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> bool {
        &self.method == method && self.path == path
    }
}

// Strip a trailing slash (other than on the root `/`).
fn normalize(path: &str) -> &str {
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

/// HTTP request router that dispatches requests to registered handler functions.
///
/// # Examples
///
/// ```rust,no_run
/// use codedraft::{Router, Response, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/ping", |_req| async { Response::new(StatusCode::Ok) });
/// router.post("/api/generateCode", |_req| async {
///     Response::new(StatusCode::Ok).body("…")
/// });
/// ```
pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for `GET` requests matching `path`.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    /// Register a handler for `POST` requests matching `path`.
    pub fn post(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Post, path, handler);
    }

    // Erase the concrete handler type and store it as a `Handler` trait object.
    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |req| handler.call(req));
        self.routes.push(Route {
            method,
            path: normalize(path).to_owned(),
            handler,
        });
    }

    /// Return the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch `request` to the first matching route and return its response.
    ///
    /// Routes are tested in registration order. If no route matches, a
    /// `404 Not Found` response is returned.
    pub async fn route(&self, request: Request) -> Response {
        let path = normalize(request.path()).to_owned();

        for route in &self.routes {
            if route.matches(request.method(), &path) {
                return (route.handler)(request).await;
            }
        }

        Response::new(StatusCode::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Request;

    fn make_request(method: &str, path: &str) -> Request {
        let raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    #[test]
    fn router_starts_empty() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn router_len_increments_on_add() {
        let mut router = Router::new();
        router.get("/a", |_req| async { Response::new(StatusCode::Ok) });
        router.post("/b", |_req| async { Response::new(StatusCode::Ok) });
        assert_eq!(router.len(), 2);
        assert!(!router.is_empty());
    }

    #[tokio::test]
    async fn empty_router_returns_404() {
        let router = Router::new();
        let res = router.route(make_request("GET", "/")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn get_matches() {
        let mut router = Router::new();
        router.get("/hello", |_req| async { Response::new(StatusCode::Ok) });
        let res = router.route(make_request("GET", "/hello")).await;
        assert_eq!(res.status(), StatusCode::Ok);
    }

    #[tokio::test]
    async fn get_does_not_match_post() {
        let mut router = Router::new();
        router.get("/hello", |_req| async { Response::new(StatusCode::Ok) });
        let res = router.route(make_request("POST", "/hello")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn trailing_slash_normalized() {
        let mut router = Router::new();
        router.post("/api/generateCode", |_req| async {
            Response::new(StatusCode::Ok)
        });
        let res = router.route(make_request("POST", "/api/generateCode/")).await;
        assert_eq!(res.status(), StatusCode::Ok);
    }

    #[tokio::test]
    async fn unregistered_path_returns_404() {
        let mut router = Router::new();
        router.get("/hello", |_req| async { Response::new(StatusCode::Ok) });
        let res = router.route(make_request("GET", "/world")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn first_matching_route_wins() {
        let mut router = Router::new();
        router.get("/path", |_req| async { Response::new(StatusCode::Ok) });
        router.get("/path", |_req| async {
            Response::new(StatusCode::NoContent)
        });

        let res = router.route(make_request("GET", "/path")).await;
        assert_eq!(res.status(), StatusCode::Ok);
    }

    #[tokio::test]
    async fn handler_sees_request_body_path() {
        let mut router = Router::new();
        router.get("/echo-path", |req: Request| async move {
            Response::new(StatusCode::Ok).body(req.path().to_owned())
        });
        let res = router.route(make_request("GET", "/echo-path")).await;
        assert_eq!(res.status(), StatusCode::Ok);
    }
}
