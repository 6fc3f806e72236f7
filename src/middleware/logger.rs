use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::web::{handler_fn, Middleware};

use super::request_id::get_req_id;

/// Logs the start and end of every request.
///
/// The end line carries the status and the time spent in the layers inside
/// this one. Server errors are logged at `warn`.
pub fn logger() -> Middleware {
    Middleware::new("logger", |next| {
        Arc::new(handler_fn(move |c, req| {
            let tag = get_req_id(c).map(|id| format!("[{id}] ")).unwrap_or_default();
            let from = req
                .remote_addr
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            info!("{tag}Started {} {:?} from {from}", req.method, req.path);

            let started = Instant::now();
            let response = next.serve_http_c(c, req);
            let elapsed = started.elapsed();

            if response.status.is_server_error() {
                warn!("{tag}Returning {} in {elapsed:?}", response.status.as_u16());
            } else {
                info!("{tag}Returning {} in {elapsed:?}", response.status.as_u16());
            }
            response
        }))
    })
}
