//! Path patterns.
//!
//! A [`Pattern`] decides whether a request belongs to a route and, once the
//! route has been chosen, binds whatever it captured into the request
//! context. Two implementations ship with the crate: Sinatra-style
//! placeholder strings ([`StringPattern`]) and left-anchored regular
//! expressions ([`RegexPattern`]). Anything else can implement the trait.

mod regexp;
mod string;

use std::fmt;
use std::sync::Arc;

use ::regex::Regex;

use crate::parser::HttpRequest;
use crate::web::context::Context;
use crate::web::error::Error;

pub use self::regexp::RegexPattern;
pub use self::string::StringPattern;

/// The URL parameter that prefix patterns bind the unmatched suffix to.
pub const WILDCARD_PARAM: &str = "*";

/// Determines whether a request matches some criteria.
pub trait Pattern: Send + Sync + fmt::Debug {
    /// A literal string every matching path starts with.
    ///
    /// The router uses it to skip patterns cheaply. Returning an empty string
    /// is always correct.
    fn prefix(&self) -> &str;

    /// Whether the request satisfies the pattern.
    ///
    /// Called speculatively while the router collects the methods that would
    /// have matched, so it must not modify anything.
    fn matches(&self, req: &HttpRequest, c: &Context) -> bool;

    /// Bind URL parameters for a request that [`matches`](Pattern::matches).
    fn run(&self, req: &HttpRequest, c: &mut Context);
}

/// The accepted forms of a route pattern.
#[derive(Debug, Clone)]
pub enum PatternSpec {
    /// A placeholder string such as `/user/:name/*`.
    Placeholder(String),
    /// A compiled regular expression, only matched from the start of the path.
    Regex(Regex),
    /// A caller-supplied pattern.
    Custom(Arc<dyn Pattern>),
}

impl PatternSpec {
    pub fn custom(pattern: impl Pattern + 'static) -> Self {
        PatternSpec::Custom(Arc::new(pattern))
    }

    /// Compile a regular expression pattern from source.
    ///
    /// Unlike a prebuilt [`Regex`], the result carries a literal prefix the
    /// router can prune on.
    pub fn regex(source: &str) -> Result<Self, Error> {
        Ok(PatternSpec::custom(RegexPattern::parse(source)?))
    }

    pub(crate) fn into_pattern(self) -> Result<Arc<dyn Pattern>, Error> {
        Ok(match self {
            PatternSpec::Placeholder(raw) => Arc::new(StringPattern::parse(&raw)?),
            PatternSpec::Regex(re) => Arc::new(RegexPattern::new(re)),
            PatternSpec::Custom(p) => p,
        })
    }
}

impl From<&str> for PatternSpec {
    fn from(raw: &str) -> Self {
        PatternSpec::Placeholder(raw.to_string())
    }
}

impl From<String> for PatternSpec {
    fn from(raw: String) -> Self {
        PatternSpec::Placeholder(raw)
    }
}

impl From<Regex> for PatternSpec {
    fn from(re: Regex) -> Self {
        PatternSpec::Regex(re)
    }
}

impl From<Arc<dyn Pattern>> for PatternSpec {
    fn from(p: Arc<dyn Pattern>) -> Self {
        PatternSpec::Custom(p)
    }
}

impl From<StringPattern> for PatternSpec {
    fn from(p: StringPattern) -> Self {
        PatternSpec::custom(p)
    }
}

impl From<RegexPattern> for PatternSpec {
    fn from(p: RegexPattern) -> Self {
        PatternSpec::custom(p)
    }
}
