//! Handler capabilities and the closure adaptors used at registration.

use std::fmt;
use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::server::{HttpResponse, StatusCode};
use crate::web::context::Context;

/// A handler that participates in the request context.
///
/// Middleware layers and routes receive the same `Context` for the lifetime
/// of a request, so URL parameters and environment values written by one
/// layer are visible to every layer inside it.
pub trait Handler: Send + Sync {
    fn serve_http_c(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse;
}

/// A handler that knows nothing about the request context.
pub trait HttpHandler: Send + Sync {
    fn serve_http(&self, req: &HttpRequest) -> HttpResponse;
}

/// Adapts a closure taking a context into a [`Handler`].
pub struct HandlerFunc<F>(F);

impl<F> Handler for HandlerFunc<F>
where
    F: Fn(&mut Context, &HttpRequest) -> HttpResponse + Send + Sync,
{
    fn serve_http_c(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse {
        (self.0)(c, req)
    }
}

/// Wrap a context-aware closure.
pub fn handler_fn<F>(f: F) -> HandlerFunc<F>
where
    F: Fn(&mut Context, &HttpRequest) -> HttpResponse + Send + Sync,
{
    HandlerFunc(f)
}

/// Adapts a plain request closure into an [`HttpHandler`].
pub struct HttpHandlerFunc<F>(F);

impl<F> HttpHandler for HttpHandlerFunc<F>
where
    F: Fn(&HttpRequest) -> HttpResponse + Send + Sync,
{
    fn serve_http(&self, req: &HttpRequest) -> HttpResponse {
        (self.0)(req)
    }
}

/// Wrap a plain request closure.
pub fn http_handler_fn<F>(f: F) -> HttpHandlerFunc<F>
where
    F: Fn(&HttpRequest) -> HttpResponse + Send + Sync,
{
    HttpHandlerFunc(f)
}

/// The thing a route dispatches to, resolved once at registration time.
#[derive(Clone)]
pub enum Endpoint {
    /// Receives the request context.
    Context(Arc<dyn Handler>),
    /// Receives only the request.
    Plain(Arc<dyn HttpHandler>),
}

impl Endpoint {
    pub fn context(handler: impl Handler + 'static) -> Self {
        Endpoint::Context(Arc::new(handler))
    }

    pub fn plain(handler: impl HttpHandler + 'static) -> Self {
        Endpoint::Plain(Arc::new(handler))
    }
}

impl Handler for Endpoint {
    fn serve_http_c(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse {
        match self {
            Endpoint::Context(h) => h.serve_http_c(c, req),
            Endpoint::Plain(h) => h.serve_http(req),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Context(_) => f.write_str("Endpoint::Context"),
            Endpoint::Plain(_) => f.write_str("Endpoint::Plain"),
        }
    }
}

impl<F> From<HandlerFunc<F>> for Endpoint
where
    F: Fn(&mut Context, &HttpRequest) -> HttpResponse + Send + Sync + 'static,
{
    fn from(f: HandlerFunc<F>) -> Self {
        Endpoint::context(f)
    }
}

impl<F> From<HttpHandlerFunc<F>> for Endpoint
where
    F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
{
    fn from(f: HttpHandlerFunc<F>) -> Self {
        Endpoint::plain(f)
    }
}

impl From<Arc<dyn Handler>> for Endpoint {
    fn from(h: Arc<dyn Handler>) -> Self {
        Endpoint::Context(h)
    }
}

impl From<Arc<dyn HttpHandler>> for Endpoint {
    fn from(h: Arc<dyn HttpHandler>) -> Self {
        Endpoint::Plain(h)
    }
}

impl<H: Handler + 'static> From<Arc<H>> for Endpoint {
    fn from(h: Arc<H>) -> Self {
        Endpoint::Context(h)
    }
}

/// The default fallback: a plain 404.
pub(crate) fn not_found(_req: &HttpRequest) -> HttpResponse {
    HttpResponse::new(StatusCode::NotFound)
        .with_content_type("text/plain; charset=utf-8")
        .with_body_string("404 page not found\n")
}
