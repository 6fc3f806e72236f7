//! A small JSON API showing regex routes, nested muxes and the
//! request-decoding middleware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use microweb::middleware::{self, AuthOptions, PARSED_JSON_KEY, URL_QUERY_KEY};
use microweb::web::{handler_fn, http_handler_fn};
use microweb::{HttpResponse, HttpServer, Mux, ServerConfig, StatusCode};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
struct Post {
    id: u64,
    title: String,
}

fn json_response(status: StatusCode, value: &impl Serialize) -> HttpResponse {
    HttpResponse::new(status)
        .with_json(value)
        .unwrap_or_else(|_| HttpResponse::status_text(StatusCode::InternalServerError))
}

fn api() -> Result<Mux, regex::Error> {
    let next_id = Arc::new(AtomicU64::new(1));

    let api = Mux::new();
    api.use_middleware(middleware::sub_router());
    api.use_middleware(middleware::url_query());
    api.use_middleware(middleware::parse_json());

    api.get("/search", handler_fn(|c, _req| {
        let query = c.env_value(URL_QUERY_KEY).cloned().unwrap_or(Value::Null);
        json_response(StatusCode::Ok, &json!({ "query": query }))
    }));

    api.get(
        Regex::new(r"^/posts/(?P<id>\d+)$")?,
        handler_fn(|c, _req| {
            let id = c.url_param("id").and_then(|id| id.parse().ok()).unwrap_or(0);
            json_response(StatusCode::Ok, &Post { id, title: format!("Post #{id}") })
        }),
    );

    api.post("/posts", handler_fn(move |c, _req| {
        let title = c
            .env_value(PARSED_JSON_KEY)
            .and_then(|body| body.get("title"))
            .and_then(Value::as_str);
        match title {
            Some(title) => {
                let id = next_id.fetch_add(1, Ordering::Relaxed);
                json_response(StatusCode::Created, &Post { id, title: title.to_string() })
            }
            None => json_response(StatusCode::BadRequest, &json!({ "error": "missing title" })),
        }
    }));

    Ok(api)
}

fn admin() -> Mux {
    let admin = Mux::new();
    admin.use_middleware(middleware::sub_router());
    admin.use_middleware(middleware::no_cache());
    admin.use_middleware(middleware::basic_auth(AuthOptions::new("admin", "admin", "secret")));
    admin.get("/", http_handler_fn(|_req| {
        HttpResponse::new(StatusCode::Ok).with_body_string("admin area\n")
    }));
    admin
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mux = Mux::new();
    mux.use_middleware(middleware::request_id());
    mux.use_middleware(middleware::real_ip());
    mux.use_middleware(middleware::logger());
    mux.use_middleware(middleware::recoverer());
    mux.use_middleware(middleware::automatic_options());

    mux.get("/", http_handler_fn(|_req| {
        HttpResponse::new(StatusCode::Ok)
            .with_content_type("text/html")
            .with_body_string("<html><body><h1>Welcome to microweb-rs!</h1></body></html>")
    }));
    mux.handle("/api/*", Arc::new(api()?));
    mux.handle("/admin/*", Arc::new(admin()));
    mux.not_found(http_handler_fn(|req| {
        json_response(StatusCode::NotFound, &json!({ "error": "not found", "path": req.url_path() }))
    }));

    let config = ServerConfig {
        addr: "127.0.0.1:8080".parse()?,
        ..ServerConfig::default()
    };
    HttpServer::new(config, Arc::new(mux)).start().await?;
    Ok(())
}
