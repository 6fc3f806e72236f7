//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target, including any query string
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
    /// The peer address, when the request arrived over a socket
    pub remote_addr: Option<SocketAddr>,
}

impl HttpRequest {
    /// Create a new HTTP request with an empty body.
    pub fn new(method: Method, path: String, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        Self {
            method,
            path,
            version,
            headers,
            body: Vec::new(),
            remote_addr: None,
        }
    }

    /// Create a new HTTP request with a body.
    pub fn with_body(method: Method, path: String, version: HttpVersion, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let mut request = Self::new(method, path, version, headers);
        request.body = body;
        request
    }

    /// Shorthand for a bodyless HTTP/1.1 request without headers.
    pub fn bare(method: Method, path: impl Into<String>) -> Self {
        Self::new(method, path.into(), HttpVersion::Http11, HashMap::new())
    }

    /// The path component of the request target, without the query string.
    ///
    /// This is what routes are matched against.
    pub fn url_path(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }

    /// The raw query string, if the target has one.
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, q)| q)
    }

    /// Copy this request with its URL path replaced, keeping the query string.
    pub fn with_url_path(&self, url_path: &str) -> Self {
        let mut request = self.clone();
        request.path = match self.query() {
            Some(q) => format!("{url_path}?{q}"),
            None => url_path.to_string(),
        };
        request
    }

    /// Get a header value, ignoring the case of the name.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Remove a header regardless of the case it was sent with.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let key = self.headers.keys().find(|k| k.eq_ignore_ascii_case(name))?.clone();
        self.headers.remove(&key)
    }

    /// Check if the request has a JSON body.
    pub fn is_json(&self) -> bool {
        self.get_header("Content-Type")
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }
}

/// Locate the end of the header section, returning (head_len, body_start).
fn split_head(input: &[u8]) -> (usize, usize) {
    let crlf = input.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = input.windows(2).position(|w| w == b"\n\n");
    match (crlf, lf) {
        (Some(a), Some(b)) if b < a => (b, b + 2),
        (Some(a), _) => (a, a + 4),
        (None, Some(b)) => (b, b + 2),
        (None, None) => (input.len(), input.len()),
    }
}

/// Parse an HTTP request from a byte slice.
///
/// Everything after the blank line that terminates the header section is
/// taken verbatim as the body.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let (head_len, body_start) = split_head(input);
    let head = std::str::from_utf8(&input[..head_len]).map_err(|_| Error::InvalidEncoding)?;

    let mut lines = head.lines();

    let request_line = lines.next().ok_or(Error::EmptyRequest)?;

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;

    let path = parts[1].to_string();
    if !path.starts_with('/') && path != "*" {
        return Err(Error::InvalidTarget(path));
    }

    let version = HttpVersion::from_str(parts[2])?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::InvalidHeader(line.to_string()))?;
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    if version == HttpVersion::Http11 && !headers.keys().any(|k| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHost);
    }

    let body = input.get(body_start..).unwrap_or_default().to_vec();
    Ok(HttpRequest::with_body(method, path, version, headers, body))
}
