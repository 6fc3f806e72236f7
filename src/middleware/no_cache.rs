use std::sync::Arc;

use crate::web::{http_handler_fn, Middleware};

/// Response headers that stop clients and proxies from caching.
pub const NO_CACHE_HEADERS: [(&str, &str); 4] = [
    ("Expires", "Thu, 01 Jan 1970 00:00:00 UTC"),
    ("Cache-Control", "no-cache, private, max-age=0"),
    ("Pragma", "no-cache"),
    ("X-Accel-Expires", "0"),
];

/// Conditional request headers removed before the request reaches the
/// handler.
pub const ETAG_HEADERS: [&str; 6] = [
    "ETag",
    "If-Modified-Since",
    "If-Match",
    "If-None-Match",
    "If-Range",
    "If-Unmodified-Since",
];

/// Makes every response uncacheable.
///
/// Strips the [`ETAG_HEADERS`] from the request so handlers never answer
/// 304, and sets the [`NO_CACHE_HEADERS`] on the response.
pub fn no_cache() -> Middleware {
    Middleware::plain("no_cache", |next| {
        Arc::new(http_handler_fn(move |req| {
            let response = if ETAG_HEADERS.iter().any(|h| req.has_header(h)) {
                let mut stripped = req.clone();
                for header in ETAG_HEADERS {
                    stripped.remove_header(header);
                }
                next.serve_http(&stripped)
            } else {
                next.serve_http(req)
            };

            NO_CACHE_HEADERS
                .iter()
                .fold(response, |response, (name, value)| response.with_header(*name, *value))
        }))
    })
}
