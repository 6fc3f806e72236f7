use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::error;

use crate::server::{HttpResponse, StatusCode};
use crate::web::{handler_fn, Middleware};

use super::request_id::get_req_id;

fn describe(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "Box<dyn Any>"
    }
}

/// Turns a panic in any inner layer or handler into a logged 500 response.
///
/// Without it, a panicking handler unwinds into whatever is serving the
/// connection.
pub fn recoverer() -> Middleware {
    Middleware::new("recoverer", |next| {
        Arc::new(handler_fn(move |c, req| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| next.serve_http_c(c, req)));
            match result {
                Ok(response) => response,
                Err(payload) => {
                    let tag = get_req_id(c).map(|id| format!("[{id}] ")).unwrap_or_default();
                    error!("{tag}panic: {}", describe(payload.as_ref()));
                    HttpResponse::status_text(StatusCode::InternalServerError)
                }
            }
        }))
    })
}
