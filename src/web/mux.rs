//! The request multiplexer.

use std::sync::Arc;

use log::error;

use crate::parser::{HttpRequest, Method};
use crate::server::HttpResponse;
use crate::web::compiler::Program;
use crate::web::config::MuxConfig;
use crate::web::context::Context;
use crate::web::error::Error;
use crate::web::handler::{Endpoint, Handler, HttpHandler};
use crate::web::method::MethodSet;
use crate::web::pattern::PatternSpec;
use crate::web::router::{Route, Router};
use crate::web::stack::{Middleware, MiddlewareStack};

/// A router wrapped in a middleware stack.
///
/// Routes are tried in the order they were registered and the first one
/// whose pattern and method both match is dispatched. Requests that match
/// no route go to the NotFound handler; if some route matched the path with
/// a different method, the sorted method names are stored in the context
/// under [`VALID_METHODS_KEY`](crate::web::VALID_METHODS_KEY) first.
///
/// Every registration method takes `&self`, so a mux can be shared behind an
/// `Arc` and still be configured.
///
/// ```
/// use microweb::web::{http_handler_fn, Mux};
/// use microweb::{HttpRequest, HttpResponse, Method, StatusCode};
///
/// let mux = Mux::new();
/// mux.get("/hello/:name", http_handler_fn(|_req| {
///     HttpResponse::new(StatusCode::Ok).with_body_string("hi")
/// }));
///
/// let response = mux.serve_http(&HttpRequest::bare(Method::GET, "/hello/carl"));
/// assert_eq!(response.status, StatusCode::Ok);
/// ```
pub struct Mux {
    stack: MiddlewareStack,
    router: Arc<Router>,
}

impl Mux {
    /// A mux with no routes and no middleware.
    pub fn new() -> Self {
        Self::with_config(MuxConfig::default())
    }

    pub fn with_config(config: MuxConfig) -> Self {
        let router = Arc::new(Router::new());
        let inner: Arc<dyn Handler> = router.clone();
        Self {
            stack: MiddlewareStack::new(inner, config.stack_pool_size),
            router,
        }
    }

    /// Register a route for the given methods, reporting a malformed pattern
    /// instead of panicking.
    pub fn try_handle(
        &self,
        pattern: impl Into<PatternSpec>,
        methods: MethodSet,
        handler: impl Into<Endpoint>,
    ) -> Result<(), Error> {
        let pattern = pattern.into().into_pattern()?;
        self.router.handle(pattern, methods, handler.into());
        Ok(())
    }

    fn register(&self, pattern: PatternSpec, methods: MethodSet, handler: Endpoint) {
        if let Err(e) = self.try_handle(pattern, methods, handler) {
            error!("{e}");
            panic!("{e}");
        }
    }

    /// Dispatch requests of any method that match `pattern` to `handler`.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is malformed. The same holds for every
    /// method-specific registration function.
    pub fn handle(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::ALL, handler.into());
    }

    pub fn connect(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::of(Method::CONNECT), handler.into());
    }

    pub fn delete(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::of(Method::DELETE), handler.into());
    }

    /// Dispatch GET requests matching `pattern` to `handler`. HEAD requests
    /// are routed here as well.
    pub fn get(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        let methods = MethodSet::of(Method::GET).with(Method::HEAD);
        self.register(pattern.into(), methods, handler.into());
    }

    pub fn head(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::of(Method::HEAD), handler.into());
    }

    pub fn options(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::of(Method::OPTIONS), handler.into());
    }

    pub fn patch(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::of(Method::PATCH), handler.into());
    }

    pub fn post(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::of(Method::POST), handler.into());
    }

    pub fn put(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::of(Method::PUT), handler.into());
    }

    pub fn trace(&self, pattern: impl Into<PatternSpec>, handler: impl Into<Endpoint>) {
        self.register(pattern.into(), MethodSet::of(Method::TRACE), handler.into());
    }

    /// Replace the handler used when no route matches.
    pub fn not_found(&self, handler: impl Into<Endpoint>) {
        self.router.set_not_found(handler.into());
    }

    /// Compile the routing table now instead of on the next request.
    pub fn compile(&self) {
        self.router.compile();
    }

    /// The compiled routing program, compiling it first if needed.
    pub fn program(&self) -> Program {
        self.router.machine().program().clone()
    }

    /// The registered routes in matching order.
    pub fn routes(&self) -> Arc<Vec<Route>> {
        self.router.routes()
    }

    /// Append a middleware layer. Layers run in the order they were added.
    pub fn use_middleware(&self, middleware: Middleware) {
        self.stack.use_middleware(middleware);
    }

    /// Add a layer directly before the first layer named `before`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMiddleware`] if there is no such layer.
    pub fn insert(&self, middleware: Middleware, before: &str) -> Result<(), Error> {
        self.stack.insert(middleware, before)
    }

    /// Remove the first layer named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMiddleware`] if there is no such layer.
    pub fn abandon(&self, name: &str) -> Result<(), Error> {
        self.stack.abandon(name)
    }

    /// Names of the installed layers, outermost first.
    pub fn middleware_names(&self) -> Vec<String> {
        self.stack.names()
    }

    /// The middleware stack and its chain pool.
    pub fn stack(&self) -> &MiddlewareStack {
        &self.stack
    }

    /// Serve a request with a fresh context.
    pub fn serve_http(&self, req: &HttpRequest) -> HttpResponse {
        let mut c = Context::new();
        self.serve_http_c(&mut c, req)
    }

    /// Serve a request with a caller-supplied context.
    pub fn serve_http_c(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse {
        let stack = self.stack.alloc();
        let response = stack.serve_http_c(c, req);
        self.stack.release(stack);
        response
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Mux {
    fn serve_http_c(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse {
        Mux::serve_http_c(self, c, req)
    }
}

impl HttpHandler for Mux {
    fn serve_http(&self, req: &HttpRequest) -> HttpResponse {
        Mux::serve_http(self, req)
    }
}
