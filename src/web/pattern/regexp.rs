//! Regular expression patterns.

use std::collections::HashMap;
use std::fmt;

use log::warn;
use regex::Regex;
use regex_syntax::hir::{Class, Hir, HirKind};

use crate::parser::HttpRequest;
use crate::web::context::Context;
use crate::web::pattern::Pattern;

/// A pattern backed by a regular expression.
///
/// Only matches that start at the beginning of the path count, whether or
/// not the expression is anchored with `^` or `\A`. Named groups bind under
/// their name and unnamed groups under `$N`.
///
/// A literal prefix is derived only for expressions compiled from source by
/// [`RegexPattern::parse`]. A prebuilt [`Regex`] may carry builder flags
/// that its source text does not show, so it gets an empty prefix.
#[derive(Clone)]
pub struct RegexPattern {
    re: Regex,
    prefix: String,
    names: Vec<String>,
}

impl RegexPattern {
    /// Wrap a compiled expression as is.
    pub fn new(re: Regex) -> Self {
        Self::with_prefix(re, String::new())
    }

    /// Compile `source` with default flags and derive its literal prefix.
    pub fn parse(source: &str) -> Result<Self, regex::Error> {
        let re = Regex::new(source)?;
        let prefix = match regex_syntax::parse(source) {
            Ok(hir) => literal_prefix(&hir),
            Err(e) => {
                warn!("web: unable to parse regexp {source:?}, routing will not prune it: {e}");
                String::new()
            }
        };
        Ok(Self::with_prefix(re, prefix))
    }

    fn with_prefix(re: Regex, prefix: String) -> Self {
        let names = re
            .capture_names()
            .enumerate()
            .map(|(i, name)| name.map_or_else(|| format!("${i}"), str::to_string))
            .collect();
        Self { re, prefix, names }
    }

    pub fn regex(&self) -> &Regex {
        &self.re
    }

    fn find<'p>(&self, path: &'p str) -> Option<regex::Captures<'p>> {
        // leftmost search returns a match at 0 whenever one exists
        let caps = self.re.captures(path)?;
        (caps.get(0)?.start() == 0).then_some(caps)
    }

    /// Match a bare path, returning the bound parameters.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.find(path)?;
        Some(
            self.names
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, name)| {
                    let value = caps.get(i).map_or("", |m| m.as_str());
                    (name.clone(), value.to_string())
                })
                .collect(),
        )
    }
}

impl Pattern for RegexPattern {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn matches(&self, req: &HttpRequest, _c: &Context) -> bool {
        self.find(req.url_path()).is_some()
    }

    fn run(&self, req: &HttpRequest, c: &mut Context) {
        if let Some(params) = self.match_path(req.url_path()) {
            c.url_params.extend(params);
        }
    }
}

impl fmt::Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegexPattern({:?})", self.re.as_str())
    }
}

/// Walk the leading concatenation of `hir`, collecting case-sensitive
/// single-character atoms. Zero-width assertions are allowed only before the
/// first character. Groups, alternations and repetitions end the walk.
fn literal_prefix(hir: &Hir) -> String {
    let mut buf = String::new();
    let mut at_start = true;
    collect_prefix(hir, &mut buf, &mut at_start);
    buf
}

fn collect_prefix(hir: &Hir, buf: &mut String, at_start: &mut bool) -> bool {
    match hir.kind() {
        HirKind::Empty => true,
        HirKind::Look(_) => *at_start,
        HirKind::Literal(lit) => match std::str::from_utf8(&lit.0) {
            Ok(s) => {
                buf.push_str(s);
                *at_start = false;
                true
            }
            Err(_) => false,
        },
        HirKind::Class(class) => match single_char(class) {
            Some(ch) => {
                buf.push(ch);
                *at_start = false;
                true
            }
            None => false,
        },
        HirKind::Concat(parts) => parts.iter().all(|part| collect_prefix(part, buf, at_start)),
        HirKind::Capture(_) | HirKind::Repetition(_) | HirKind::Alternation(_) => false,
    }
}

fn single_char(class: &Class) -> Option<char> {
    match class {
        Class::Unicode(c) => match c.ranges() {
            [r] if r.start() == r.end() => Some(r.start()),
            _ => None,
        },
        Class::Bytes(c) => match c.ranges() {
            [r] if r.start() == r.end() && r.start().is_ascii() => Some(char::from(r.start())),
            _ => None,
        },
    }
}
