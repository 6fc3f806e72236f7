//! Ready-made middleware for a [`Mux`](crate::web::Mux).
//!
//! Every function here returns a named [`Middleware`](crate::web::Middleware)
//! that can be passed to [`Mux::use_middleware`](crate::web::Mux::use_middleware).
//! The names are the function names, so a layer added with
//! `mux.use_middleware(logger())` is removed again with
//! `mux.abandon("logger")`.
//!
//! A typical stack:
//!
//! ```
//! use microweb::middleware;
//! use microweb::web::Mux;
//!
//! let mux = Mux::new();
//! mux.use_middleware(middleware::request_id());
//! mux.use_middleware(middleware::logger());
//! mux.use_middleware(middleware::recoverer());
//! mux.use_middleware(middleware::automatic_options());
//! assert_eq!(
//!     mux.middleware_names(),
//!     ["request_id", "logger", "recoverer", "automatic_options"]
//! );
//! ```

mod basic_auth;
mod env_init;
mod etag;
mod logger;
mod no_cache;
mod options;
mod parse_json;
mod real_ip;
mod recoverer;
mod request_id;
mod sub_router;
mod url_query;

pub use basic_auth::{basic_auth, AuthOptions};
pub use env_init::env_init;
pub use etag::etag;
pub use logger::logger;
pub use no_cache::{no_cache, ETAG_HEADERS, NO_CACHE_HEADERS};
pub use options::automatic_options;
pub use parse_json::{parse_json, PARSED_JSON_KEY};
pub use real_ip::{real_ip, ORIGINAL_REMOTE_ADDR_KEY};
pub use recoverer::recoverer;
pub use request_id::{get_req_id, request_id, REQUEST_ID_KEY};
pub use sub_router::sub_router;
pub use url_query::{url_query, URL_QUERY_KEY};
