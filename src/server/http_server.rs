//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::parser::parse_request;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};
use crate::web::Mux;

/// An HTTP server dispatching every request through a [`Mux`].
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    mux: Arc<Mux>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig, mux: Arc<Mux>) -> Self {
        Self { config, mux }
    }

    /// The mux requests are dispatched to.
    pub fn mux(&self) -> &Arc<Mux> {
        &self.mux
    }

    /// Log the routes and middleware that will serve requests.
    fn display_server_info(&self) {
        info!("Registered routes:");
        for route in self.mux.routes().iter() {
            info!("  {:?} {:?}", route.methods(), route.pattern());
        }

        let middleware = self.mux.middleware_names();
        if !middleware.is_empty() {
            info!("Middleware: {}", middleware.join(" -> "));
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Serve a freshly accepted connection on its own task, or turn it away
    /// if the server is full.
    async fn handle_new_connection(
        mut socket: TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        mux: Arc<Mux>,
        read_buffer_size: usize,
    ) {
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let response = HttpResponse::new(StatusCode::ServiceUnavailable)
                    .with_content_type("text/plain")
                    .with_body_string("Server is at capacity, please try again later");
                let _ = socket.write_all(&response.to_bytes()).await;
                return;
            }
        };

        tokio::spawn(async move {
            // held until the connection is done
            let _permit = permit;

            if let Err(e) =
                Self::handle_connection(&mut socket, &mux, Some(addr), read_buffer_size).await
            {
                error!("Error handling connection from {addr}: {e}");
            }
        });
    }

    /// Decide whether an accept error should stop the server.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // back off before accepting again
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        false
    }

    /// Bind and serve connections until accepting fails for good.
    pub async fn start(&self) -> Result<(), Error> {
        self.display_server_info();
        self.mux.compile();

        let listener = self.setup_listener().await?;
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));

        loop {
            match listener.accept().await {
                Ok((socket, addr)) => {
                    debug!("Accepted connection from {addr}");
                    Self::handle_new_connection(
                        socket,
                        addr,
                        Arc::clone(&semaphore),
                        Arc::clone(&self.mux),
                        self.config.read_buffer_size,
                    )
                    .await;
                }
                Err(e) => {
                    if Self::handle_connection_error(e).await {
                        break;
                    }
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Read one request from `socket`, dispatch it through `mux` and write
    /// the response.
    ///
    /// A request that does not parse is answered with 400 and reported as
    /// [`Error::ParseError`].
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        mux: &Mux,
        remote_addr: Option<SocketAddr>,
        read_buffer_size: usize,
    ) -> Result<(), Error> {
        let mut buf = vec![0; read_buffer_size];

        let n = socket.read(&mut buf).await?;
        if n == 0 {
            // closed before sending anything
            return Ok(());
        }

        let mut request = match parse_request(&buf[..n]) {
            Ok(req) => req,
            Err(e) => {
                let response = HttpResponse::new(StatusCode::BadRequest)
                    .with_content_type("text/plain")
                    .with_body_string(format!("Error parsing request: {e}"));
                socket.write_all(&response.to_bytes()).await?;
                return Err(Error::ParseError(e));
            }
        };
        request.remote_addr = remote_addr;

        let response = mux.serve_http(&request);
        socket.write_all(&response.to_bytes()).await?;
        socket.flush().await?;
        Ok(())
    }
}
