//! A small tokio front-end that feeds requests into a [`Mux`](crate::web::Mux).
//!
//! Each connection is read once, parsed with the crate's parser, dispatched
//! through the mux and answered. There is no keep-alive.

mod response;
mod config;
mod error;
mod http_server;
mod tests;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use config::ServerConfig;
pub use error::Error;
pub use http_server::HttpServer;
