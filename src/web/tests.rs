//! Tests for routing, dispatch and the middleware stack.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    use regex::{Regex, RegexBuilder};
    use serde_json::json;

    use crate::parser::{HttpRequest, Method};
    use crate::server::{HttpResponse, StatusCode};
    use crate::web::{
        handler_fn, http_handler_fn, Context, Endpoint, Error, Handler, HttpHandler, MethodSet,
        Middleware, Mux, Pattern, PatternSpec, VALID_METHODS_KEY,
    };

    type Log = Arc<Mutex<Vec<String>>>;

    fn text(s: impl Into<String>) -> HttpResponse {
        HttpResponse::new(StatusCode::Ok).with_body_string(s)
    }

    fn body(response: &HttpResponse) -> String {
        String::from_utf8_lossy(&response.body).into_owned()
    }

    fn get(mux: &Mux, path: &str) -> HttpResponse {
        mux.serve_http(&HttpRequest::bare(Method::GET, path))
    }

    fn says(s: &'static str) -> Endpoint {
        http_handler_fn(move |_req| text(s)).into()
    }

    fn record(log: &Log, name: &'static str) -> Middleware {
        let log = Arc::clone(log);
        Middleware::new(name, move |next| {
            let log = Arc::clone(&log);
            Arc::new(handler_fn(move |c, req| {
                log.lock().unwrap().push(name.to_string());
                next.serve_http_c(c, req)
            }))
        })
    }

    fn recording_mux(log: &Log) -> Mux {
        let mux = Mux::new();
        let log = Arc::clone(log);
        mux.handle("/*", http_handler_fn(move |_req| {
            log.lock().unwrap().push("router".to_string());
            text("ok")
        }));
        mux
    }

    fn drain(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[test]
    fn test_methods() {
        let mux = Mux::new();
        mux.connect("/", says("CONNECT"));
        mux.delete("/", says("DELETE"));
        mux.head("/", says("HEAD"));
        mux.get("/", says("GET"));
        mux.options("/", says("OPTIONS"));
        mux.patch("/", says("PATCH"));
        mux.post("/", says("POST"));
        mux.put("/", says("PUT"));
        mux.trace("/", says("TRACE"));

        for method in Method::ALL {
            let response = mux.serve_http(&HttpRequest::bare(method, "/"));
            assert_eq!(body(&response), method.as_str());
        }
    }

    #[test]
    fn test_get_also_serves_head() {
        let mux = Mux::new();
        mux.get("/", says("GET"));
        let response = mux.serve_http(&HttpRequest::bare(Method::HEAD, "/"));
        assert_eq!(body(&response), "GET");
    }

    #[test]
    fn test_handle_serves_every_method() {
        let mux = Mux::new();
        mux.handle("/", says("any"));
        for method in Method::ALL {
            let response = mux.serve_http(&HttpRequest::bare(method, "/"));
            assert_eq!(body(&response), "any");
        }
    }

    struct Greeter;

    impl Handler for Greeter {
        fn serve_http_c(&self, c: &mut Context, _req: &HttpRequest) -> HttpResponse {
            text(format!("hello {}", c.url_param("name").unwrap_or("nobody")))
        }
    }

    struct Plain;

    impl HttpHandler for Plain {
        fn serve_http(&self, _req: &HttpRequest) -> HttpResponse {
            text("plain handler")
        }
    }

    #[test]
    fn test_handler_types() {
        let mux = Mux::new();
        mux.get("/a", http_handler_fn(|_req| text("http fn")));
        mux.get("/b", Arc::new(Plain) as Arc<dyn HttpHandler>);
        mux.get("/c", handler_fn(|_c, _req| text("web fn")));
        mux.get("/d/:name", Arc::new(Greeter));
        mux.get("/e", Endpoint::context(Greeter));

        assert_eq!(body(&get(&mux, "/a")), "http fn");
        assert_eq!(body(&get(&mux, "/b")), "plain handler");
        assert_eq!(body(&get(&mux, "/c")), "web fn");
        assert_eq!(body(&get(&mux, "/d/carl")), "hello carl");
        assert_eq!(body(&get(&mux, "/e")), "hello nobody");
    }

    #[derive(Debug)]
    struct Always;

    impl Pattern for Always {
        fn prefix(&self) -> &str {
            ""
        }

        fn matches(&self, _req: &HttpRequest, _c: &Context) -> bool {
            true
        }

        fn run(&self, _req: &HttpRequest, _c: &mut Context) {}
    }

    #[test]
    fn test_pattern_types() {
        let mux = Mux::new();
        mux.get("/hello/carl", says("string"));
        mux.get("/hello/:name", says("placeholder"));
        mux.get(Regex::new(r"^/hola/(?P<name>.+)$").unwrap(), says("regex"));
        mux.get(PatternSpec::custom(Always), says("custom"));

        assert_eq!(body(&get(&mux, "/hello/carl")), "string");
        assert_eq!(body(&get(&mux, "/hello/bob")), "placeholder");
        assert_eq!(body(&get(&mux, "/hola/bob")), "regex");
        assert_eq!(body(&get(&mux, "/anything/else")), "custom");
    }

    #[test]
    fn test_invalid_patterns_are_reported() {
        let mux = Mux::new();
        let result = mux.try_handle("/:a/:a", MethodSet::ALL, says("dup"));
        assert!(matches!(result, Err(Error::InvalidPattern { ref pattern, .. }) if pattern == "/:a/:a"));

        let result = PatternSpec::regex("^/(unclosed");
        assert!(matches!(result, Err(Error::InvalidRegex(_))));
        assert!(mux.routes().is_empty());
    }

    #[test]
    #[should_panic]
    fn test_registration_panics_on_bad_pattern() {
        let mux = Mux::new();
        mux.get("/:/x", says("nameless"));
    }

    /// Matches whenever its index is at or above a shared threshold, so
    /// raising the threshold knocks out routes one registration at a time.
    #[derive(Debug)]
    struct Threshold {
        index: usize,
        counter: Arc<AtomicUsize>,
        prefix: String,
    }

    impl Pattern for Threshold {
        fn prefix(&self) -> &str {
            &self.prefix
        }

        fn matches(&self, _req: &HttpRequest, _c: &Context) -> bool {
            self.index >= self.counter.load(Ordering::SeqCst)
        }

        fn run(&self, _req: &HttpRequest, _c: &mut Context) {}
    }

    #[test]
    fn test_route_selection() {
        let routes = ["/", "/a", "/a", "/b", "/ab", "/", "/ba", "/b", "/a"];
        let table: [(&str, [i32; 10]); 7] = [
            ("/", [0, 5, 5, 5, 5, 5, -1, -1, -1, -1]),
            ("/a", [0, 1, 2, 5, 5, 5, 8, 8, 8, -1]),
            ("/b", [0, 3, 3, 3, 5, 5, 7, 7, -1, -1]),
            ("/ab", [0, 1, 2, 4, 4, 5, 8, 8, 8, -1]),
            ("/ba", [0, 3, 3, 3, 5, 5, 6, 7, -1, -1]),
            ("/c", [0, 5, 5, 5, 5, 5, -1, -1, -1, -1]),
            ("nope", [-1, -1, -1, -1, -1, -1, -1, -1, -1, -1]),
        ];

        let mux = Mux::new();
        let counter = Arc::new(AtomicUsize::new(0));
        mux.not_found(http_handler_fn(|_req| text("-1")));
        for (index, prefix) in routes.iter().enumerate() {
            let pattern = Threshold {
                index,
                counter: Arc::clone(&counter),
                prefix: prefix.to_string(),
            };
            mux.get(PatternSpec::custom(pattern), http_handler_fn(move |_req| text(index.to_string())));
        }

        for (path, results) in table {
            for (n, expected) in results.iter().enumerate() {
                counter.store(n, Ordering::SeqCst);
                let actual = body(&get(&mux, path));
                assert_eq!(actual, expected.to_string(), "{path:?} at threshold {n}");
            }
        }
    }

    #[test]
    fn test_insertion_order_precedence() {
        let mux = Mux::new();
        mux.get("/", says("0"));
        mux.get("/a", says("1"));
        mux.get("/a", says("2"));
        mux.get("/b", says("3"));

        assert_eq!(body(&get(&mux, "/a")), "1");
        assert_eq!(body(&get(&mux, "/b")), "3");
        assert_eq!(body(&get(&mux, "/")), "0");
    }

    #[test]
    fn test_not_found() {
        let mux = Mux::new();
        let response = mux.serve_http(&HttpRequest::bare(Method::POST, "/"));
        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(body(&response), "404 page not found\n");

        mux.not_found(http_handler_fn(|_req| {
            HttpResponse::new(StatusCode::NotImplemented).with_body_string("I'm a teapot!")
        }));
        let response = mux.serve_http(&HttpRequest::bare(Method::POST, "/"));
        assert_eq!(response.status, StatusCode::NotImplemented);
    }

    #[test]
    fn test_prefix() {
        let mux = Mux::new();
        mux.handle("/hello/*", http_handler_fn(|req| text(req.url_path())));
        assert_eq!(body(&get(&mux, "/hello/world")), "/hello/world");
    }

    #[test]
    fn test_prefix_binds_the_rest() {
        let mux = Mux::new();
        mux.get("/user/:user/*", handler_fn(|c, _req| {
            text(format!("{} {}", c.url_param("user").unwrap_or(""), c.url_param("*").unwrap_or("")))
        }));

        assert_eq!(body(&get(&mux, "/user/bob/friends/123")), "bob /friends/123");
        assert_eq!(get(&mux, "/user/bob").status, StatusCode::NotFound);
        assert_eq!(get(&mux, "/user/").status, StatusCode::NotFound);
    }

    #[test]
    fn test_query_string_is_ignored() {
        let mux = Mux::new();
        mux.get("/search", says("found"));
        assert_eq!(body(&get(&mux, "/search?q=rust")), "found");
    }

    fn valid_methods_mux() -> Mux {
        let mux = Mux::new();
        mux.not_found(handler_fn(|c, _req| {
            text(c.valid_methods().unwrap_or_default().join(","))
        }));

        let nf = || http_handler_fn(|_req| text("matched"));
        mux.get("/hello/carl", nf());
        mux.post("/hello/carl", nf());
        mux.head("/hello/bob", nf());
        mux.get("/hello/:name", nf());
        mux.put("/hello/:name", nf());
        mux.patch("/hello/:name", nf());
        mux.get("/:greet/carl", nf());
        mux.put("/:greet/carl", nf());
        mux.delete("/:greet/:anyone", nf());
        mux
    }

    fn assert_valid_methods(mux: &Mux) {
        let table = [
            ("/hello/carl", "DELETE,GET,HEAD,PATCH,POST,PUT"),
            ("/hello/bob", "DELETE,GET,HEAD,PATCH,PUT"),
            ("/hola/carl", "DELETE,GET,HEAD,PUT"),
            ("/hola/bob", "DELETE"),
            ("/does/not/compute", ""),
        ];
        for (path, expected) in table {
            let response = mux.serve_http(&HttpRequest::bare(Method::TRACE, path));
            assert_eq!(body(&response), expected, "valid methods for {path:?}");
        }
    }

    #[test]
    fn test_valid_methods() {
        let mux = valid_methods_mux();
        assert_valid_methods(&mux);

        // still reported when a layer has already populated the environment
        mux.use_middleware(Middleware::new("env", |next| {
            Arc::new(handler_fn(move |c, req| {
                c.env.insert("seen".to_string(), json!(true));
                next.serve_http_c(c, req)
            }))
        }));
        assert_valid_methods(&mux);
    }

    #[test]
    fn test_valid_methods_are_not_set_without_a_pattern_match() {
        let mux = Mux::new();
        mux.get("/x", says("x"));
        let mut c = Context::new();
        mux.serve_http_c(&mut c, &HttpRequest::bare(Method::GET, "/y"));
        assert!(c.env_value(VALID_METHODS_KEY).is_none());
    }

    #[test]
    fn test_method_aggregation() {
        let mux = Mux::new();
        mux.try_handle("/x", MethodSet::of(Method::GET), says("get")).unwrap();
        mux.put("/x", says("put"));

        let mut c = Context::new();
        let response = mux.serve_http_c(&mut c, &HttpRequest::bare(Method::POST, "/x"));
        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(c.env_value(VALID_METHODS_KEY), Some(&json!(["GET", "PUT"])));
        assert_eq!(c.valid_methods(), Some(vec!["GET".to_string(), "PUT".to_string()]));
    }

    #[test]
    fn test_regex_left_anchoring() {
        let mux = Mux::new();
        mux.get(PatternSpec::regex("/hello").unwrap(), says("loose"));
        mux.get(PatternSpec::regex("^/exact$").unwrap(), says("exact"));

        assert_eq!(body(&get(&mux, "/hello/world")), "loose");
        assert_eq!(get(&mux, "/world/hello").status, StatusCode::NotFound);
        assert_eq!(body(&get(&mux, "/exact")), "exact");
        assert_eq!(get(&mux, "/exact/more").status, StatusCode::NotFound);
    }

    #[test]
    fn test_regex_builder_flags_survive_routing() {
        let mux = Mux::new();
        mux.get("/h", says("short"));
        mux.get(RegexBuilder::new("^/hello$").case_insensitive(true).build().unwrap(), says("anchored"));
        mux.get(RegexBuilder::new("/loose").case_insensitive(true).build().unwrap(), says("loose"));
        mux.get("/zzz", says("last"));

        assert_eq!(body(&get(&mux, "/HELLO")), "anchored");
        assert_eq!(body(&get(&mux, "/hello")), "anchored");
        assert_eq!(body(&get(&mux, "/LOOSE/and/more")), "loose");
        assert_eq!(get(&mux, "/x/LOOSE").status, StatusCode::NotFound);
        assert_eq!(body(&get(&mux, "/zzz")), "last");
    }

    #[test]
    fn test_idempotent_recompilation() {
        let mux = valid_methods_mux();
        mux.compile();
        let first = mux.program();
        mux.compile();
        let second = mux.program();
        assert_eq!(first, second);
        assert_valid_methods(&mux);
    }

    #[test]
    fn test_registration_after_compile_is_seen() {
        let mux = Mux::new();
        mux.get("/a", says("a"));
        mux.compile();
        assert_eq!(get(&mux, "/b").status, StatusCode::NotFound);

        mux.get("/b", says("b"));
        assert_eq!(body(&get(&mux, "/b")), "b");
    }

    #[test]
    fn test_empty_mux_reports_no_match() {
        let mux = Mux::new();
        assert!(mux.program().is_empty());
        assert_eq!(get(&mux, "/").status, StatusCode::NotFound);
    }

    #[test]
    fn test_middleware_order() {
        let log: Log = Arc::default();
        let mux = recording_mux(&log);
        mux.use_middleware(record(&log, "one"));
        mux.use_middleware(record(&log, "two"));

        get(&mux, "/");
        assert_eq!(drain(&log), ["one", "two", "router"]);

        mux.use_middleware(record(&log, "three"));
        mux.use_middleware(record(&log, "four"));
        get(&mux, "/");
        assert_eq!(drain(&log), ["one", "two", "three", "four", "router"]);
    }

    #[test]
    fn test_middleware_insert() {
        let log: Log = Arc::default();
        let mux = recording_mux(&log);
        mux.use_middleware(record(&log, "one"));
        mux.use_middleware(record(&log, "two"));

        let err = mux.insert(record(&log, "sloth"), "squirrel").unwrap_err();
        assert!(matches!(err, Error::UnknownMiddleware(ref name) if name == "squirrel"));

        mux.insert(record(&log, "middle"), "two").unwrap();
        mux.insert(record(&log, "start"), "one").unwrap();
        assert_eq!(mux.middleware_names(), ["start", "one", "middle", "two"]);

        get(&mux, "/");
        assert_eq!(drain(&log), ["start", "one", "middle", "two", "router"]);
    }

    #[test]
    fn test_middleware_abandon() {
        let log: Log = Arc::default();
        let mux = recording_mux(&log);
        mux.use_middleware(record(&log, "one"));
        mux.use_middleware(record(&log, "two"));
        mux.use_middleware(record(&log, "three"));

        mux.abandon("two").unwrap();
        get(&mux, "/");
        assert_eq!(drain(&log), ["one", "three", "router"]);

        assert!(matches!(mux.abandon("panda"), Err(Error::UnknownMiddleware(_))));

        mux.abandon("one").unwrap();
        mux.abandon("three").unwrap();
        get(&mux, "/");
        assert_eq!(drain(&log), ["router"]);

        mux.use_middleware(record(&log, "one"));
        get(&mux, "/");
        assert_eq!(drain(&log), ["one", "router"]);
    }

    #[test]
    fn test_duplicate_names_resolve_to_the_outermost() {
        let log: Log = Arc::default();
        let mux = recording_mux(&log);
        mux.use_middleware(record(&log, "dup"));
        mux.use_middleware(record(&log, "other"));
        mux.use_middleware(record(&log, "dup"));

        mux.insert(record(&log, "first"), "dup").unwrap();
        mux.abandon("dup").unwrap();
        assert_eq!(mux.middleware_names(), ["first", "other", "dup"]);
    }

    #[test]
    fn test_plain_layers_pass_the_context_through() {
        let mux = Mux::new();
        mux.get("/", handler_fn(|c, _req| text(c.env_str("user").unwrap_or("missing"))));

        mux.use_middleware(Middleware::new("auth", |next| {
            Arc::new(handler_fn(move |c, req| {
                c.env.insert("user".to_string(), json!("carl"));
                next.serve_http_c(c, req)
            }))
        }));
        mux.use_middleware(Middleware::plain("header", |next| {
            Arc::new(http_handler_fn(move |req| {
                next.serve_http(req).with_header("X-Plain", "yes")
            }))
        }));

        let mut c = Context::new();
        let response = mux.serve_http_c(&mut c, &HttpRequest::bare(Method::GET, "/"));
        assert_eq!(body(&response), "carl");
        assert_eq!(response.headers.get("X-Plain").map(String::as_str), Some("yes"));
        assert_eq!(c.env_str("user"), Some("carl"));
    }

    #[test]
    fn test_each_request_gets_a_fresh_context() {
        let mux = Mux::new();
        mux.get("/", handler_fn(|c, _req| {
            let count = c.env.len();
            c.env.insert(format!("key{count}"), json!(count));
            text(count.to_string())
        }));
        mux.use_middleware(Middleware::plain("noop", |next| next));

        for _ in 0..3 {
            assert_eq!(body(&get(&mux, "/")), "0");
        }
    }

    #[test]
    fn test_stacks_are_pooled() {
        let mux = Mux::new();
        mux.get("/", says("ok"));
        assert_eq!(mux.stack().pooled(), 0);
        get(&mux, "/");
        assert_eq!(mux.stack().pooled(), 1);
        get(&mux, "/");
        assert_eq!(mux.stack().pooled(), 1);
    }

    #[test]
    fn test_cache_barrier() {
        let log: Log = Arc::default();
        let mux = recording_mux(&log);
        mux.use_middleware(record(&log, "old"));

        let stack = mux.stack().alloc();
        let old_generation = stack.generation();

        mux.abandon("old").unwrap();
        mux.use_middleware(record(&log, "new"));
        mux.stack().release(stack);
        assert_eq!(mux.stack().pooled(), 0);

        let fresh = mux.stack().alloc();
        assert_ne!(fresh.generation(), old_generation);
        assert_eq!(fresh.generation(), mux.stack().generation());
        mux.stack().release(fresh);

        get(&mux, "/");
        assert_eq!(drain(&log), ["new", "router"]);
    }

    #[test]
    fn test_in_flight_stack_keeps_its_middleware() {
        let log: Log = Arc::default();
        let mux = recording_mux(&log);
        mux.use_middleware(record(&log, "old"));

        let stack = mux.stack().alloc();
        mux.abandon("old").unwrap();

        let mut c = Context::new();
        stack.serve_http_c(&mut c, &HttpRequest::bare(Method::GET, "/"));
        mux.stack().release(stack);
        assert_eq!(drain(&log), ["old", "router"]);

        get(&mux, "/");
        assert_eq!(drain(&log), ["router"]);
    }

    #[test]
    fn test_nested_mux() {
        let api = Arc::new(Mux::new());
        api.get("/api/users/:id", handler_fn(|c, _req| text(c.url_param("id").unwrap_or(""))));

        let mux = Mux::new();
        mux.handle("/api/*", Arc::clone(&api));
        mux.get("/", says("root"));

        assert_eq!(body(&get(&mux, "/api/users/7")), "7");
        assert_eq!(body(&get(&mux, "/")), "root");
    }

    #[test]
    fn test_concurrent_requests_and_mutation() {
        let log: Log = Arc::default();
        let mux = recording_mux(&log);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(get(&mux, "/").status, StatusCode::Ok);
                    }
                });
            }
            s.spawn(|| {
                for i in 0..20 {
                    mux.use_middleware(record(&log, "layer"));
                    if i % 2 == 0 {
                        mux.abandon("layer").unwrap();
                    }
                }
            });
        });

        assert_eq!(mux.middleware_names().len(), 10);
        assert!(mux.stack().pooled() <= 32);
    }
}
