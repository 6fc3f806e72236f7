use std::sync::Arc;

use md5::{Digest, Md5};

use crate::parser::HttpRequest;
use crate::server::{HttpResponse, StatusCode};
use crate::web::{http_handler_fn, Middleware};

/// The quoted entity tag of a response body.
fn entity_tag(body: &[u8]) -> String {
    format!("\"{:x}\"", Md5::digest(body))
}

fn is_fresh(req: &HttpRequest, tag: &str) -> bool {
    req.get_header("If-None-Match").is_some_and(|header| {
        header
            .split(',')
            .map(str::trim)
            .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == tag)
    })
}

/// Tags successful responses with an MD5 `ETag` of their body.
///
/// When the request's `If-None-Match` already names that tag the body is
/// dropped and the status becomes 304.
pub fn etag() -> Middleware {
    Middleware::plain("etag", |next| {
        Arc::new(http_handler_fn(move |req| {
            let response = next.serve_http(req);
            if !response.status.is_success() {
                return response;
            }

            let tag = entity_tag(&response.body);
            if is_fresh(req, &tag) {
                let mut not_modified = response.with_body_bytes(Vec::new());
                not_modified.status = StatusCode::NotModified;
                not_modified.remove_header("Content-Type");
                not_modified.with_header("ETag", tag)
            } else {
                response.with_header("ETag", tag)
            }
        }))
    })
}
