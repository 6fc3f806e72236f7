//! Request parsing.
//!
//! [`parse_request`] turns the bytes of one HTTP/1.x request into an
//! [`HttpRequest`]. The mux routes on [`HttpRequest::url_path`], the target
//! with its query string removed.

mod error;
mod method;
mod request;
mod version;

pub use self::error::Error;
pub use self::method::Method;
pub use self::request::{parse_request, HttpRequest};
pub use self::version::HttpVersion;
