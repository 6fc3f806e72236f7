use std::sync::Arc;

use serde_json::Value;

use crate::server::{HttpResponse, StatusCode};
use crate::web::{handler_fn, Middleware};

/// Environment key holding the decoded request body.
pub const PARSED_JSON_KEY: &str = "parsedJSON";

/// Decodes `application/json` request bodies into [`PARSED_JSON_KEY`].
///
/// A body that is not valid JSON is answered with 400 before the inner
/// layers run. Other content types pass through untouched.
pub fn parse_json() -> Middleware {
    Middleware::new("parse_json", |next| {
        Arc::new(handler_fn(move |c, req| {
            if req.is_json() {
                match serde_json::from_slice::<Value>(&req.body) {
                    Ok(parsed) => {
                        c.env.insert(PARSED_JSON_KEY.to_string(), parsed);
                    }
                    Err(e) => {
                        return HttpResponse::new(StatusCode::BadRequest)
                            .with_content_type("text/plain; charset=utf-8")
                            .with_body_string(format!("{e}\n"));
                    }
                }
            }
            next.serve_http_c(c, req)
        }))
    })
}
