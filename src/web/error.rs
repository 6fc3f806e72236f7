//! Error types for route registration and middleware management.

use thiserror::Error;

/// Errors raised while configuring a [`Mux`](crate::web::Mux).
#[derive(Debug, Error)]
pub enum Error {
    /// No middleware with the given name is present in the stack.
    #[error("web: unknown middleware {0:?}")]
    UnknownMiddleware(String),

    /// A placeholder pattern could not be parsed.
    #[error("web: invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The raw pattern as registered.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A regular expression pattern failed to compile.
    #[error("web: invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),
}
