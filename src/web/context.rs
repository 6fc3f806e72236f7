//! Per-request state threaded through middleware and handlers.

use std::collections::HashMap;

use serde_json::Value;

/// The environment key under which the router reports the methods that would
/// have matched a path when no route accepted the request's method.
pub const VALID_METHODS_KEY: &str = "web.validMethods";

/// Request-scoped context.
///
/// A fresh, empty context is used for every request. URL parameters are
/// written by the pattern of the route that is dispatched; `env` is free-form
/// storage for middleware to hand data to each other and to handlers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    /// Named captures bound by the matched pattern.
    pub url_params: HashMap<String, String>,
    /// Free-form values set by middleware.
    pub env: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a bound URL parameter.
    pub fn url_param(&self, name: &str) -> Option<&str> {
        self.url_params.get(name).map(String::as_str)
    }

    /// Look up an environment value.
    pub fn env_value(&self, key: &str) -> Option<&Value> {
        self.env.get(key)
    }

    /// Look up a string environment value.
    pub fn env_str(&self, key: &str) -> Option<&str> {
        self.env.get(key).and_then(Value::as_str)
    }

    /// The sorted list of methods recorded by the router before it fell
    /// through to the NotFound handler.
    pub fn valid_methods(&self) -> Option<Vec<String>> {
        let methods = self.env.get(VALID_METHODS_KEY)?.as_array()?;
        Some(
            methods
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    /// True when nothing has been written into the context.
    pub fn is_empty(&self) -> bool {
        self.url_params.is_empty() && self.env.is_empty()
    }

    /// Drop every parameter and environment value.
    pub fn clear(&mut self) {
        self.url_params.clear();
        self.env.clear();
    }
}
