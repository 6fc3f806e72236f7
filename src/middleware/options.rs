use std::sync::Arc;

use crate::parser::Method;
use crate::server::StatusCode;
use crate::web::{handler_fn, Middleware};

/// Answers OPTIONS requests for paths that have routes but no OPTIONS
/// handler.
///
/// If the router would 404 an OPTIONS request while some route matched the
/// path under another method, the response becomes an empty 200 with an
/// `Allow` header listing those methods plus OPTIONS. Explicit OPTIONS
/// routes and every other method are left alone.
pub fn automatic_options() -> Middleware {
    Middleware::new("automatic_options", |next| {
        Arc::new(handler_fn(move |c, req| {
            let mut response = next.serve_http_c(c, req);
            if req.method != Method::OPTIONS || response.status != StatusCode::NotFound {
                return response;
            }
            let Some(mut methods) = c.valid_methods() else {
                return response;
            };

            if !methods.iter().any(|m| m == Method::OPTIONS.as_str()) {
                methods.push(Method::OPTIONS.as_str().to_string());
            }
            response.status = StatusCode::Ok;
            response.remove_header("Content-Type");
            response.set_header("Allow", methods.join(", "));
            response.with_body_bytes(Vec::new())
        }))
    })
}
