//! Tests for the HTTP server front-end.

#[cfg(test)]
mod server_tests {
    use std::io::{self, Cursor};
    use std::net::SocketAddr;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

    use crate::middleware;
    use crate::server::{Error, HttpResponse, HttpServer, ServerConfig, StatusCode};
    use crate::web::{handler_fn, http_handler_fn, Mux};

    // Mock TcpStream for testing
    struct MockTcpStream {
        read_data: Cursor<Vec<u8>>,
        write_data: Vec<u8>,
    }

    impl MockTcpStream {
        fn new(read_data: &[u8]) -> Self {
            Self {
                read_data: Cursor::new(read_data.to_vec()),
                write_data: Vec::new(),
            }
        }

        fn written(&self) -> String {
            String::from_utf8_lossy(&self.write_data).into_owned()
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let n = std::io::Read::read(&mut this.read_data, buf.initialize_unfilled())?;
            buf.advance(n);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn test_mux() -> Mux {
        let mux = Mux::new();
        mux.get("/test", http_handler_fn(|_req| {
            HttpResponse::new(StatusCode::Ok)
                .with_content_type("text/plain")
                .with_body_string("Test response")
        }));
        mux.post("/items", http_handler_fn(|req| {
            HttpResponse::new(StatusCode::Created).with_body_bytes(req.body.clone())
        }));
        mux.get("/users/:id", handler_fn(|c, _req| {
            HttpResponse::new(StatusCode::Ok)
                .with_body_string(format!("user {}", c.url_param("id").unwrap_or("?")))
        }));
        mux.get("/whoami", http_handler_fn(|req| {
            let addr = req.remote_addr.map(|a| a.to_string()).unwrap_or_default();
            HttpResponse::new(StatusCode::Ok).with_body_string(addr)
        }));
        mux
    }

    async fn roundtrip(mux: &Mux, request: &[u8]) -> (Result<(), Error>, String) {
        let mut stream = MockTcpStream::new(request);
        let result = HttpServer::handle_connection(&mut stream, mux, None, 1024).await;
        (result, stream.written())
    }

    #[tokio::test]
    async fn test_server_creation() {
        let config = ServerConfig {
            addr: "127.0.0.1:8080".parse().unwrap(),
            max_connections: 100,
            read_buffer_size: 4096,
        };

        let mux = Arc::new(test_mux());
        let server = HttpServer::new(config.clone(), Arc::clone(&mux));
        assert_eq!(server.config.addr, config.addr);
        assert_eq!(server.config.max_connections, config.max_connections);
        assert_eq!(server.config.read_buffer_size, config.read_buffer_size);
        assert!(Arc::ptr_eq(server.mux(), &mux));
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(config.max_connections, 1024);
        assert_eq!(config.read_buffer_size, 8192);
    }

    #[tokio::test]
    async fn test_handle_connection_with_valid_request() {
        let mux = test_mux();
        let (result, response) =
            roundtrip(&mux, b"GET /test HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

        assert!(result.is_ok());
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/plain\r\n"));
        assert!(response.ends_with("Test response"));
    }

    #[tokio::test]
    async fn test_handle_connection_binds_parameters() {
        let mux = test_mux();
        let (result, response) =
            roundtrip(&mux, b"GET /users/42?verbose=1 HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

        assert!(result.is_ok());
        assert!(response.ends_with("user 42"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_body() {
        let mux = test_mux();
        let (result, response) = roundtrip(
            &mux,
            b"POST /items HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\r\n{\"a\":1}",
        )
        .await;

        assert!(result.is_ok());
        assert!(response.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(response.contains("Content-Length: 7\r\n"));
        assert!(response.ends_with("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_not_found() {
        let mux = test_mux();
        let (result, response) =
            roundtrip(&mux, b"GET /nonexistent HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

        // an unmatched path is an ordinary response, not a server error
        assert!(result.is_ok());
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.ends_with("404 page not found\n"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_wrong_method() {
        let mux = test_mux();
        let (result, response) =
            roundtrip(&mux, b"DELETE /test HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

        assert!(result.is_ok());
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[tokio::test]
    async fn test_automatic_options_through_the_server() {
        let mux = test_mux();
        mux.use_middleware(middleware::automatic_options());
        let (result, response) =
            roundtrip(&mux, b"OPTIONS /test HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

        assert!(result.is_ok());
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Allow: GET, HEAD, OPTIONS\r\n"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_invalid_request() {
        let mux = test_mux();
        let (result, response) = roundtrip(&mux, b"INVALID REQUEST").await;

        assert!(matches!(result, Err(Error::ParseError(_))));
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("Error parsing request:"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_closed_socket() {
        let mux = test_mux();
        let (result, response) = roundtrip(&mux, b"").await;

        assert!(result.is_ok());
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_remote_addr_is_stamped() {
        let mux = test_mux();
        let addr = SocketAddr::from(([10, 0, 0, 7], 5555));
        let mut stream = MockTcpStream::new(b"GET /whoami HTTP/1.1\r\nHost: localhost\r\n\r\n");

        let result = HttpServer::handle_connection(&mut stream, &mux, Some(addr), 1024).await;

        assert!(result.is_ok());
        assert!(stream.written().ends_with("10.0.0.7:5555"));
    }

    #[tokio::test]
    async fn test_mux_shared_across_tasks() {
        let mux = Arc::new(test_mux());
        let mut handles = Vec::new();

        for id in 0..8 {
            let mux = Arc::clone(&mux);
            handles.push(tokio::spawn(async move {
                let request = format!("GET /users/{id} HTTP/1.1\r\nHost: localhost\r\n\r\n");
                let mut stream = MockTcpStream::new(request.as_bytes());
                HttpServer::handle_connection(&mut stream, &mux, None, 1024)
                    .await
                    .unwrap();
                stream.written()
            }));
        }

        for (id, handle) in handles.into_iter().enumerate() {
            let response = handle.await.unwrap();
            assert!(response.ends_with(&format!("user {id}")));
        }
    }

    #[test]
    fn test_response_serialization() {
        let response = HttpResponse::new(StatusCode::NoContent);
        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(text.contains("Server: microweb-rs\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_response_headers_are_case_insensitive() {
        let mut response = HttpResponse::new(StatusCode::Ok).with_header("x-token", "a");
        response.set_header("X-Token", "b");
        assert_eq!(response.header("X-TOKEN"), Some("b"));
        assert_eq!(response.headers.len(), 2);
        assert_eq!(response.remove_header("x-token"), Some("b".to_string()));
        assert_eq!(response.header("X-Token"), None);
    }

    #[test]
    fn test_response_json() {
        #[derive(serde::Serialize)]
        struct User {
            name: String,
        }

        let response = HttpResponse::new(StatusCode::Ok)
            .with_json(&User { name: "carl".to_string() })
            .unwrap();
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body, br#"{"name":"carl"}"#);
    }

    #[test]
    fn test_status_classes() {
        assert!(StatusCode::Created.is_success());
        assert!(StatusCode::NotFound.is_client_error());
        assert!(StatusCode::BadGateway.is_server_error());
        assert_eq!(StatusCode::NotModified.as_u16(), 304);
        assert_eq!(StatusCode::Found.to_string(), "302 Found");
        assert_eq!(
            String::from_utf8(HttpResponse::status_text(StatusCode::Forbidden).body).unwrap(),
            "Forbidden\n"
        );
    }
}
