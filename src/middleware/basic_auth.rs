//! HTTP Basic authentication.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::parser::HttpRequest;
use crate::server::{HttpResponse, StatusCode};
use crate::web::{handler_fn, http_handler_fn, Endpoint, Handler, Middleware};

/// Credentials and behaviour for [`basic_auth`].
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Realm sent in the `WWW-Authenticate` challenge.
    pub realm: String,
    pub user: String,
    pub password: String,
    /// Serves requests that fail authentication. Defaults to a plain 401.
    pub unauthorized: Option<Endpoint>,
}

impl AuthOptions {
    pub fn new(realm: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            user: user.into(),
            password: password.into(),
            unauthorized: None,
        }
    }

    /// Replace the handler for unauthenticated requests.
    pub fn with_unauthorized(mut self, handler: impl Into<Endpoint>) -> Self {
        self.unauthorized = Some(handler.into());
        self
    }

    fn authenticate(&self, req: &HttpRequest) -> bool {
        let Some(encoded) = req.get_header("Authorization").and_then(|h| h.strip_prefix("Basic ")) else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(credentials) = String::from_utf8(decoded) else {
            return false;
        };
        match credentials.split_once(':') {
            Some((user, password)) => user == self.user && password == self.password,
            None => false,
        }
    }
}

fn unauthorized(_req: &HttpRequest) -> HttpResponse {
    HttpResponse::new(StatusCode::Unauthorized)
        .with_content_type("text/plain; charset=utf-8")
        .with_body_string("You are not authorized to access this resource.")
}

/// Requires HTTP Basic credentials matching `options` before passing the
/// request on.
///
/// Failed requests get the `WWW-Authenticate` challenge on whatever the
/// unauthorized handler returns.
pub fn basic_auth(options: AuthOptions) -> Middleware {
    let options = Arc::new(options);
    Middleware::new("basic_auth", move |next| {
        let options = Arc::clone(&options);
        let rejected = options
            .unauthorized
            .clone()
            .unwrap_or_else(|| Endpoint::plain(http_handler_fn(unauthorized)));
        Arc::new(handler_fn(move |c, req| {
            if options.authenticate(req) {
                return next.serve_http_c(c, req);
            }
            let challenge = format!("Basic realm=\"{}\"", options.realm);
            rejected.serve_http_c(c, req).with_header("WWW-Authenticate", challenge)
        }))
    })
}
