//! A small HTTP mux with compiled route matching and a reconfigurable
//! middleware stack.
//!
//! # Features
//!
//! - Routes on placeholder patterns (`/user/:id`, `/static/*`), regular
//!   expressions or any custom [`Pattern`](web::Pattern)
//! - Route tables compiled into a prefix-skipping matching program
//! - Middleware that can be added, inserted and removed while serving,
//!   with assembled chains pooled between requests
//! - A request [`Context`] carrying URL parameters and free-form values
//! - Ready-made middleware for logging, request IDs, panics, auth and more
//! - A Tokio-based HTTP/1.1 server that dispatches through a [`Mux`]
//!
//! # Examples
//!
//! ## Routing
//!
//! ```
//! use microweb::web::{handler_fn, http_handler_fn};
//! use microweb::{HttpRequest, HttpResponse, Method, Mux, StatusCode};
//! use regex::Regex;
//!
//! let mux = Mux::new();
//! mux.get("/", http_handler_fn(|_req| {
//!     HttpResponse::new(StatusCode::Ok).with_body_string("index")
//! }));
//! mux.get("/user/:name", handler_fn(|c, _req| {
//!     let name = c.url_param("name").unwrap_or_default().to_string();
//!     HttpResponse::new(StatusCode::Ok).with_body_string(name)
//! }));
//! mux.get(Regex::new(r"^/posts/(?P<id>\d+)$").unwrap(), handler_fn(|c, _req| {
//!     let id = c.url_param("id").unwrap_or_default().to_string();
//!     HttpResponse::new(StatusCode::Ok).with_body_string(id)
//! }));
//!
//! let response = mux.serve_http(&HttpRequest::bare(Method::GET, "/posts/17"));
//! assert_eq!(response.body, b"17");
//!
//! let response = mux.serve_http(&HttpRequest::bare(Method::DELETE, "/"));
//! assert_eq!(response.status, StatusCode::NotFound);
//! ```
//!
//! ## Middleware
//!
//! ```
//! use std::sync::Arc;
//!
//! use microweb::web::{handler_fn, http_handler_fn, Middleware};
//! use microweb::{middleware, HttpRequest, HttpResponse, Method, Mux, StatusCode};
//!
//! let mux = Mux::new();
//! mux.get("/", http_handler_fn(|_req| HttpResponse::new(StatusCode::Ok)));
//! mux.use_middleware(middleware::request_id());
//! mux.use_middleware(Middleware::new("powered_by", |next| {
//!     Arc::new(handler_fn(move |c, req| {
//!         next.serve_http_c(c, req).with_header("X-Powered-By", "microweb")
//!     }))
//! }));
//!
//! let response = mux.serve_http(&HttpRequest::bare(Method::GET, "/"));
//! assert_eq!(response.header("X-Powered-By"), Some("microweb"));
//!
//! mux.abandon("powered_by").unwrap();
//! let response = mux.serve_http(&HttpRequest::bare(Method::GET, "/"));
//! assert_eq!(response.header("X-Powered-By"), None);
//! ```
//!
//! ## Parsing
//!
//! ```
//! use microweb::{parse_request, Method, ParserError};
//!
//! let request = parse_request(b"GET /index.html?q=1 HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.url_path(), "/index.html");
//!
//! let invalid = parse_request(b"INVALID /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
//! assert!(matches!(invalid, Err(ParserError::InvalidMethod(_))));
//! ```
//!
//! See the `demos` directory for complete servers.

pub mod middleware;
pub mod parser;
pub mod server;
pub mod web;

pub use parser::{parse_request, Error as ParserError, HttpRequest, HttpVersion, Method};
pub use server::{Error as ServerError, HttpResponse, HttpServer, ServerConfig, StatusCode};
pub use web::{Context, Middleware, Mux, MuxConfig};
