use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use serde_json::Value;

use crate::parser::HttpRequest;
use crate::web::{handler_fn, Middleware};

/// Environment key holding the socket address the request arrived from,
/// when [`real_ip`] replaced it.
pub const ORIGINAL_REMOTE_ADDR_KEY: &str = "originalRemoteAddr";

/// The client address claimed by the proxy headers, if any.
fn claimed_ip(req: &HttpRequest) -> Option<IpAddr> {
    let claimed = match req.get_header("X-Forwarded-For") {
        Some(xff) if !xff.is_empty() => xff.split(',').next().unwrap_or_default(),
        _ => req.get_header("X-Real-IP")?.as_str(),
    };
    claimed.trim().parse().ok()
}

/// Replaces the request's remote address with the client address reported
/// by `X-Forwarded-For` (first entry) or `X-Real-IP`.
///
/// The port of the real connection is kept. Only install this behind a
/// proxy that sets these headers; otherwise clients can claim any address.
pub fn real_ip() -> Middleware {
    Middleware::new("real_ip", |next| {
        Arc::new(handler_fn(move |c, req| {
            let Some(ip) = claimed_ip(req) else {
                return next.serve_http_c(c, req);
            };

            let original = req.remote_addr.map(|addr| addr.to_string()).unwrap_or_default();
            c.env.insert(ORIGINAL_REMOTE_ADDR_KEY.to_string(), Value::String(original));

            let mut real = req.clone();
            let port = req.remote_addr.map_or(0, |addr| addr.port());
            real.remote_addr = Some(SocketAddr::new(ip, port));
            next.serve_http_c(c, &real)
        }))
    })
}
