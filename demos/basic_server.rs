//! A basic server: a few routes behind the usual middleware.

use std::sync::Arc;

use log::info;
use microweb::web::{handler_fn, http_handler_fn};
use microweb::{middleware, HttpResponse, HttpServer, Mux, ServerConfig, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mux = Mux::new();
    mux.use_middleware(middleware::request_id());
    mux.use_middleware(middleware::logger());
    mux.use_middleware(middleware::recoverer());
    mux.use_middleware(middleware::automatic_options());

    mux.get("/", http_handler_fn(|_req| {
        HttpResponse::new(StatusCode::Ok)
            .with_content_type("text/plain")
            .with_body_string("Hello, World!")
    }));

    mux.get("/hello/:name", handler_fn(|c, _req| {
        let name = c.url_param("name").unwrap_or("World");
        HttpResponse::new(StatusCode::Ok)
            .with_content_type("text/plain")
            .with_body_string(format!("Hello, {name}!"))
    }));

    mux.get("/status/:code", handler_fn(|c, _req| {
        let status = match c.url_param("code") {
            Some("404") => StatusCode::NotFound,
            Some("500") => StatusCode::InternalServerError,
            _ => StatusCode::Ok,
        };
        HttpResponse::status_text(status)
    }));

    mux.get("/panic", http_handler_fn(|_req| -> HttpResponse {
        panic!("the recoverer turns this into a 500")
    }));

    let config = ServerConfig {
        addr: "127.0.0.1:8081".parse()?,
        max_connections: 100,
        read_buffer_size: 4096,
    };

    info!("Try: curl -i http://{}/hello/you", config.addr);
    HttpServer::new(config, Arc::new(mux)).start().await?;
    Ok(())
}
