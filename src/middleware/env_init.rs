use std::sync::Arc;

use crate::web::{handler_fn, Middleware};

/// A layer that passes requests straight through.
///
/// The context's environment always exists, so there is nothing to
/// initialise. The layer is kept so stacks can name a fixed outermost point
/// to [`insert`](crate::web::Mux::insert) other layers before.
pub fn env_init() -> Middleware {
    Middleware::new("env_init", |next| {
        Arc::new(handler_fn(move |c, req| next.serve_http_c(c, req)))
    })
}
