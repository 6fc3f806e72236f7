//! Sinatra-style placeholder patterns.

use std::collections::HashMap;
use std::fmt;

use crate::parser::HttpRequest;
use crate::web::context::Context;
use crate::web::error::Error;
use crate::web::pattern::{Pattern, WILDCARD_PARAM};

/// Characters that end a placeholder name.
///
/// `/` is the path separator, `.` usually starts a file extension, and `;`
/// and `,` are the sub-delimiters RFC 3986 suggests for path segments.
const BREAK_CHARS: &[u8] = b"/.;,";

fn is_break(b: u8) -> bool {
    BREAK_CHARS.contains(&b)
}

/// A pattern made of literal text and `:name` placeholders.
///
/// A placeholder must follow a break character and captures everything up
/// to the character that follows it in the pattern (or up to the next `/`
/// when it ends the pattern). Empty captures never match, so `/:id` does
/// not match `/`.
///
/// A trailing `*` turns the pattern into a prefix match; the unmatched rest
/// of the path is bound to the `*` parameter.
#[derive(Clone, PartialEq, Eq)]
pub struct StringPattern {
    raw: String,
    names: Vec<String>,
    breaks: Vec<u8>,
    // always names.len() + 1 entries
    literals: Vec<String>,
    is_prefix: bool,
}

struct Captures<'p> {
    values: Vec<&'p str>,
    rest: &'p str,
}

impl StringPattern {
    /// Split a raw pattern into literals and placeholder names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for a placeholder without a name and
    /// for a name used twice.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidPattern {
            pattern: raw.to_string(),
            reason,
        };

        let (body, is_prefix) = match raw.strip_suffix('*') {
            Some(body) => (body, true),
            None => (raw, false),
        };
        let bytes = body.as_bytes();

        let mut names: Vec<String> = Vec::new();
        let mut breaks = Vec::new();
        let mut literals = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;
        while i + 1 < bytes.len() {
            if !(is_break(bytes[i]) && bytes[i + 1] == b':') {
                i += 1;
                continue;
            }
            let name_start = i + 2;
            let name_end = bytes[name_start..]
                .iter()
                .position(|b| is_break(*b))
                .map_or(bytes.len(), |n| name_start + n);
            if name_start == name_end {
                return Err(invalid(format!("empty placeholder name at byte {}", i + 1)));
            }
            let name = &body[name_start..name_end];
            if names.iter().any(|n| n == name) {
                return Err(invalid(format!("placeholder {name:?} appears more than once")));
            }

            literals.push(body[literal_start..=i].to_string());
            names.push(name.to_string());
            breaks.push(bytes.get(name_end).copied().unwrap_or(b'/'));
            literal_start = name_end;
            i = name_end;
        }
        literals.push(body[literal_start..].to_string());

        Ok(Self {
            raw: raw.to_string(),
            names,
            breaks,
            literals,
            is_prefix,
        })
    }

    /// The pattern as it was registered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in the order they appear.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_prefix(&self) -> bool {
        self.is_prefix
    }

    fn capture<'p>(&self, mut path: &'p str) -> Option<Captures<'p>> {
        let mut values = Vec::with_capacity(self.names.len());
        for (literal, stop) in self.literals.iter().zip(&self.breaks) {
            path = path.strip_prefix(literal.as_str())?;
            let end = path.bytes().position(|b| b == *stop).unwrap_or(path.len());
            if end == 0 {
                return None;
            }
            values.push(&path[..end]);
            path = &path[end..];
        }

        let last = self.literals.last().map_or("", String::as_str);
        let rest = if self.is_prefix {
            if !path.starts_with(last) {
                return None;
            }
            // keep the separator so the suffix is itself a rooted path
            let keep = usize::from(last.ends_with('/'));
            &path[last.len() - keep..]
        } else {
            if path != last {
                return None;
            }
            ""
        };

        Some(Captures { values, rest })
    }

    /// Match a bare path, returning the bound parameters.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.capture(path)?;
        let mut params: HashMap<String, String> = self
            .names
            .iter()
            .cloned()
            .zip(captures.values.into_iter().map(str::to_string))
            .collect();
        if self.is_prefix {
            params.insert(WILDCARD_PARAM.to_string(), captures.rest.to_string());
        }
        Some(params)
    }
}

impl Pattern for StringPattern {
    fn prefix(&self) -> &str {
        &self.literals[0]
    }

    fn matches(&self, req: &HttpRequest, _c: &Context) -> bool {
        self.capture(req.url_path()).is_some()
    }

    fn run(&self, req: &HttpRequest, c: &mut Context) {
        if let Some(params) = self.match_path(req.url_path()) {
            c.url_params.extend(params);
        }
    }
}

impl fmt::Debug for StringPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringPattern({:?}, prefix={})", self.raw, self.is_prefix)
    }
}
