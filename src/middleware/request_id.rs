//! Request IDs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use serde_json::Value;

use crate::web::{handler_fn, Context, Middleware};

/// Environment key holding the current request's ID.
pub const REQUEST_ID_KEY: &str = "reqID";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// `host/random`, fixed for the life of the process.
fn prefix() -> &'static str {
    static PREFIX: OnceLock<String> = OnceLock::new();
    PREFIX.get_or_init(|| {
        let host = std::env::var("HOSTNAME")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());

        let mut rng = rand::thread_rng();
        let mut buf = [0u8; 12];
        let mut random = String::new();
        while random.len() < 10 {
            rng.fill_bytes(&mut buf);
            random = STANDARD.encode(buf).replace(['+', '/'], "");
        }

        format!("{host}/{}", &random[..10])
    })
}

/// Stores a process-unique ID of the form `host/random-000001` under
/// [`REQUEST_ID_KEY`].
///
/// Install it outside any layer that logs, so the ID is available to them.
pub fn request_id() -> Middleware {
    Middleware::new("request_id", |next| {
        Arc::new(handler_fn(move |c, req| {
            let id = COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
            c.env.insert(
                REQUEST_ID_KEY.to_string(),
                Value::String(format!("{}-{id:06}", prefix())),
            );
            next.serve_http_c(c, req)
        }))
    })
}

/// The ID [`request_id`] assigned to this request, if any.
pub fn get_req_id(c: &Context) -> Option<&str> {
    c.env_str(REQUEST_ID_KEY)
}
