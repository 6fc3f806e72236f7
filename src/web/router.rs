//! The route table and the matching engine that runs compiled programs.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::{ArcSwap, ArcSwapOption};
use log::debug;
use serde_json::Value;

use crate::parser::HttpRequest;
use crate::server::HttpResponse;
use crate::web::compiler::{self, Instruction, Program, Target};
use crate::web::context::{Context, VALID_METHODS_KEY};
use crate::web::handler::{self, http_handler_fn, Endpoint, Handler};
use crate::web::method::MethodSet;
use crate::web::pattern::Pattern;

/// A registered route. Never modified once it is in the table.
#[derive(Clone, Debug)]
pub struct Route {
    // Most real-world routes have a cheap, selective literal prefix; both
    // built-in pattern kinds provide one.
    prefix: String,
    methods: MethodSet,
    pattern: Arc<dyn Pattern>,
    endpoint: Endpoint,
}

impl Route {
    pub(crate) fn new(pattern: Arc<dyn Pattern>, methods: MethodSet, endpoint: Endpoint) -> Self {
        Self {
            prefix: pattern.prefix().to_string(),
            methods,
            pattern,
            endpoint,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn methods(&self) -> MethodSet {
        self.methods
    }

    pub fn pattern(&self) -> &Arc<dyn Pattern> {
        &self.pattern
    }
}

/// Result of running a program against one request.
pub(crate) enum Outcome<'r> {
    /// The route whose pattern and method both matched; its parameters are
    /// already bound into the context.
    Matched(&'r Route),
    /// Nothing matched. Carries the methods of every route whose pattern did.
    NoMatch(MethodSet),
}

/// A compiled program together with the table snapshot it was built from.
#[derive(Debug)]
pub(crate) struct RouteMachine {
    program: Program,
    routes: Arc<Vec<Route>>,
}

impl RouteMachine {
    fn new(routes: Arc<Vec<Route>>) -> Self {
        let program = compiler::compile(&routes);
        Self { program, routes }
    }

    pub(crate) fn program(&self) -> &Program {
        &self.program
    }

    pub(crate) fn route(&self, req: &HttpRequest, c: &mut Context) -> Outcome<'_> {
        let path = req.url_path().as_bytes();
        let method = req.method;
        let mut methods = MethodSet::EMPTY;
        let mut cursor = 0;
        let mut pc = 0;

        while let Some(instruction) = self.program.get(pc) {
            match *instruction {
                Instruction::SetCursor(at) => {
                    cursor = at;
                    pc += 1;
                }
                Instruction::Literal { bytes, len, on_mismatch } => {
                    let len = usize::from(len);
                    let rest = path.get(cursor..).unwrap_or_default();
                    if rest.len() >= len && rest[..len] == bytes[..len] {
                        cursor += len;
                        pc += 1;
                    } else {
                        match on_mismatch {
                            Target::Index(next) => pc = next,
                            Target::Fail => break,
                        }
                    }
                }
                Instruction::Route(index) => {
                    let route = &self.routes[index];
                    if route.pattern.matches(req, c) {
                        methods |= route.methods;
                        if route.methods.contains(method) {
                            route.pattern.run(req, c);
                            return Outcome::Matched(route);
                        }
                    }
                    pc += 1;
                }
            }
        }

        Outcome::NoMatch(methods)
    }
}

/// Find where a route with prefix `prefix` goes so that the table stays
/// sorted by prefix without ever moving a route ahead of an earlier one it
/// could compete with for the same path.
fn insertion_point(routes: &[Route], prefix: &str) -> usize {
    let mut i = routes.len();
    while i > 0 {
        let before = routes[i - 1].prefix.as_str();
        if before <= prefix || before.starts_with(prefix) {
            break;
        }
        i -= 1;
    }
    i
}

/// The routing table.
///
/// Writers copy the table under `lock` and swap the new one in; readers on
/// the request path only ever load snapshots.
pub struct Router {
    lock: Mutex<()>,
    routes: ArcSwap<Vec<Route>>,
    machine: ArcSwapOption<RouteMachine>,
    not_found: ArcSwap<Endpoint>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            routes: ArcSwap::from_pointee(Vec::new()),
            machine: ArcSwapOption::empty(),
            not_found: ArcSwap::from_pointee(Endpoint::plain(http_handler_fn(handler::not_found))),
        }
    }

    /// Add a route. Invalidates the compiled program.
    pub(crate) fn handle(&self, pattern: Arc<dyn Pattern>, methods: MethodSet, endpoint: Endpoint) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let route = Route::new(pattern, methods, endpoint);
        debug!("web: adding route {:?} for {methods:?}", route.pattern);

        let current = self.routes.load();
        let at = insertion_point(&current, &route.prefix);
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend_from_slice(&current[..at]);
        next.push(route);
        next.extend_from_slice(&current[at..]);

        self.machine.store(None);
        self.routes.store(Arc::new(next));
    }

    /// Replace the fallback handler.
    pub(crate) fn set_not_found(&self, endpoint: Endpoint) {
        self.not_found.store(Arc::new(endpoint));
    }

    /// Compile the current table and install the result.
    pub(crate) fn compile(&self) -> Arc<RouteMachine> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let machine = Arc::new(RouteMachine::new(self.routes.load_full()));
        debug!(
            "web: compiled {} routes into {} instructions",
            machine.routes.len(),
            machine.program.len()
        );
        self.machine.store(Some(Arc::clone(&machine)));
        machine
    }

    /// The installed program, compiling one first if there is none.
    pub(crate) fn machine(&self) -> Arc<RouteMachine> {
        match self.machine.load_full() {
            Some(machine) => machine,
            None => self.compile(),
        }
    }

    /// Snapshot of the table in matching order.
    pub fn routes(&self) -> Arc<Vec<Route>> {
        self.routes.load_full()
    }

    /// Dispatch a request to the first matching route, or to the NotFound
    /// handler with the valid methods recorded in the environment.
    pub fn route(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse {
        let machine = self.machine();
        match machine.route(req, c) {
            Outcome::Matched(route) => route.endpoint.serve_http_c(c, req),
            Outcome::NoMatch(methods) => {
                if !methods.is_empty() {
                    let names = methods.names().into_iter().map(Value::from).collect();
                    c.env.insert(VALID_METHODS_KEY.to_string(), Value::Array(names));
                }
                let not_found = self.not_found.load_full();
                not_found.serve_http_c(c, req)
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Router {
    fn serve_http_c(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse {
        self.route(c, req)
    }
}
