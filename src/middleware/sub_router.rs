use std::sync::Arc;

use crate::web::{handler_fn, Middleware, WILDCARD_PARAM};

/// Lets a nested mux route on the part of the path its parent left over.
///
/// Install it on the inner mux and mount that mux under a prefix pattern.
/// Inside the layer the request path becomes the parent's `*` parameter;
/// the query string is kept.
///
/// ```
/// use std::sync::Arc;
/// use microweb::middleware::sub_router;
/// use microweb::web::{http_handler_fn, Mux};
/// use microweb::{HttpRequest, HttpResponse, Method, StatusCode};
///
/// let admin = Arc::new(Mux::new());
/// admin.use_middleware(sub_router());
/// admin.get("/users", http_handler_fn(|_req| HttpResponse::new(StatusCode::Ok)));
///
/// let root = Mux::new();
/// root.handle("/admin/*", admin);
///
/// let response = root.serve_http(&HttpRequest::bare(Method::GET, "/admin/users"));
/// assert_eq!(response.status, StatusCode::Ok);
/// ```
pub fn sub_router() -> Middleware {
    Middleware::new("sub_router", |next| {
        Arc::new(handler_fn(move |c, req| {
            match c.url_param(WILDCARD_PARAM).map(str::to_string) {
                Some(rest) => {
                    let sub = req.with_url_path(&rest);
                    next.serve_http_c(c, &sub)
                }
                None => next.serve_http_c(c, req),
            }
        }))
    })
}
