use thiserror::Error;

/// Why a request head could not be turned into an [`HttpRequest`](crate::parser::HttpRequest).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("http: empty request")]
    EmptyRequest,

    /// The head is not valid UTF-8.
    #[error("http: request head is not valid UTF-8")]
    InvalidEncoding,

    /// The request line does not have exactly three parts.
    #[error("http: malformed request line {0:?}")]
    MalformedRequestLine(String),

    /// A method the mux cannot route.
    #[error("http: unsupported method {0:?}")]
    InvalidMethod(String),

    /// The target is neither an absolute path nor `*`.
    #[error("http: request target {0:?} is not an absolute path")]
    InvalidTarget(String),

    #[error("http: unsupported version {0:?}")]
    InvalidVersion(String),

    /// A header line without a colon.
    #[error("http: malformed header line {0:?}")]
    InvalidHeader(String),

    /// HTTP/1.1 requests must name the host.
    #[error("http: HTTP/1.1 request without a Host header")]
    MissingHost,
}
