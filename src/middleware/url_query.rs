use std::sync::Arc;

use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::parser::HttpRequest;
use crate::web::{handler_fn, Middleware};

/// Environment key holding the decoded query string.
pub const URL_QUERY_KEY: &str = "urlquery";

/// Decode the query string into an object of name to list of values.
fn query_values(req: &HttpRequest) -> Map<String, Value> {
    let query = req.query().unwrap_or_default();
    let query = query.split_once('#').map_or(query, |(q, _)| q);

    let mut values = Map::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        let entry = values
            .entry(name.into_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = entry {
            list.push(Value::String(value.into_owned()));
        }
    }
    values
}

/// Decodes the query string once and stores it under [`URL_QUERY_KEY`] as a
/// JSON object mapping each name to the list of its values, in order.
pub fn url_query() -> Middleware {
    Middleware::new("url_query", |next| {
        Arc::new(handler_fn(move |c, req| {
            c.env.insert(URL_QUERY_KEY.to_string(), Value::Object(query_values(req)));
            next.serve_http_c(c, req)
        }))
    })
}
