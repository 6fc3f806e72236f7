//! Request routing and middleware.
//!
//! A [`Mux`] holds an ordered list of routes, each a [`Pattern`], a
//! [`MethodSet`] and an [`Endpoint`]. The list is compiled into a small
//! program that skips over groups of routes sharing a literal prefix, and
//! the mux wraps dispatch in a [`MiddlewareStack`] whose assembled chains are
//! pooled between requests.
//!
//! ```
//! use microweb::web::{handler_fn, Mux};
//! use microweb::{HttpRequest, HttpResponse, Method, StatusCode};
//!
//! let mux = Mux::new();
//! mux.get("/user/:name", handler_fn(|c, _req| {
//!     let name = c.url_param("name").unwrap_or_default().to_string();
//!     HttpResponse::new(StatusCode::Ok).with_body_string(name)
//! }));
//!
//! let response = mux.serve_http(&HttpRequest::bare(Method::GET, "/user/carl"));
//! assert_eq!(response.body, b"carl");
//! ```

mod compiler;
mod config;
mod context;
mod error;
mod handler;
mod method;
mod mux;
mod pattern;
mod router;
mod stack;
mod tests;

pub use self::compiler::{Instruction, Program, Target};
pub use self::config::MuxConfig;
pub use self::context::{Context, VALID_METHODS_KEY};
pub use self::error::Error;
pub use self::handler::{
    handler_fn, http_handler_fn, Endpoint, Handler, HandlerFunc, HttpHandler, HttpHandlerFunc,
};
pub use self::method::MethodSet;
pub use self::mux::Mux;
pub use self::pattern::{Pattern, PatternSpec, RegexPattern, StringPattern, WILDCARD_PARAM};
pub use self::router::Route;
pub use self::stack::{CachedStack, ContextWrap, Layer, Middleware, MiddlewareStack, PlainWrap};
