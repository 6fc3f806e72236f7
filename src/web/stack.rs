//! The middleware stack and the pool of assembled handler chains.
//!
//! Assembling a chain allocates one handler per layer, so assembled chains
//! are pooled and reused across requests. Every mutation of the layer list
//! starts a new generation; a chain is only ever returned to the pool of
//! the generation it was built from, and chains built from an older
//! generation are dropped on release.

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use log::{debug, trace};

use crate::parser::HttpRequest;
use crate::server::HttpResponse;
use crate::web::context::Context;
use crate::web::error::Error;
use crate::web::handler::{Handler, HttpHandler};

/// Wraps a context-aware handler.
pub type ContextWrap = dyn Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync;

/// Wraps a plain handler.
pub type PlainWrap = dyn Fn(Arc<dyn HttpHandler>) -> Arc<dyn HttpHandler> + Send + Sync;

/// The two kinds of wrapping function a layer can be built from.
#[derive(Clone)]
pub enum Layer {
    /// Wraps a handler that receives the request context.
    Context(Arc<ContextWrap>),
    /// Wraps a handler that only sees the request. The context still flows
    /// through to the layers inside it.
    Plain(Arc<PlainWrap>),
}

/// A named middleware layer.
///
/// The name is the layer's identity for [`insert`](MiddlewareStack::insert)
/// and [`abandon`](MiddlewareStack::abandon).
#[derive(Clone)]
pub struct Middleware {
    name: String,
    layer: Layer,
}

impl Middleware {
    /// A layer that wraps context-aware handlers.
    pub fn new<F>(name: impl Into<String>, wrap: F) -> Self
    where
        F: Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            layer: Layer::Context(Arc::new(wrap)),
        }
    }

    /// A layer that wraps plain handlers.
    pub fn plain<F>(name: impl Into<String>, wrap: F) -> Self
    where
        F: Fn(Arc<dyn HttpHandler>) -> Arc<dyn HttpHandler> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            layer: Layer::Plain(Arc::new(wrap)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.layer {
            Layer::Context(_) => "context",
            Layer::Plain(_) => "plain",
        };
        f.debug_struct("Middleware")
            .field("name", &self.name)
            .field("layer", &kind)
            .finish()
    }
}

/// Holds the request context while a plain layer, which cannot carry it,
/// is running.
#[derive(Default)]
struct ContextSlot(Mutex<Context>);

impl ContextSlot {
    fn lock(&self) -> MutexGuard<'_, Context> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lends the stashed context to the chain below a plain layer and puts it
/// back in the slot when dropped, including during a panic.
struct Lend<'a> {
    slot: &'a ContextSlot,
    c: Context,
}

impl Drop for Lend<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = mem::take(&mut self.c);
    }
}

/// Stashes the caller's context while a plain layer runs and hands it back
/// when dropped.
struct Stash<'a> {
    slot: &'a ContextSlot,
    c: &'a mut Context,
}

impl Drop for Stash<'_> {
    fn drop(&mut self) {
        *self.c = mem::take(&mut *self.slot.lock());
    }
}

/// Presents the context-aware chain below a plain layer as a plain handler.
struct ToPlain {
    inner: Arc<dyn Handler>,
    slot: Arc<ContextSlot>,
}

impl HttpHandler for ToPlain {
    fn serve_http(&self, req: &HttpRequest) -> HttpResponse {
        let c = mem::take(&mut *self.slot.lock());
        let mut lent = Lend { slot: &self.slot, c };
        self.inner.serve_http_c(&mut lent.c, req)
    }
}

/// Presents a plain layer as a context-aware handler.
struct FromPlain {
    outer: Arc<dyn HttpHandler>,
    slot: Arc<ContextSlot>,
}

impl Handler for FromPlain {
    fn serve_http_c(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse {
        *self.slot.lock() = mem::take(c);
        let _stash = Stash { slot: &self.slot, c };
        self.outer.serve_http(req)
    }
}

/// One fully assembled chain of middleware around the innermost handler.
pub struct CachedStack {
    handler: Arc<dyn Handler>,
    slot: Arc<ContextSlot>,
    generation: u64,
}

impl CachedStack {
    /// The generation of the middleware list this chain was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Handler for CachedStack {
    fn serve_http_c(&self, c: &mut Context, req: &HttpRequest) -> HttpResponse {
        self.handler.serve_http_c(c, req)
    }
}

impl fmt::Debug for CachedStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedStack")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// One version of the middleware list together with its idle chains.
struct Generation {
    id: u64,
    layers: Vec<Middleware>,
    idle: Mutex<Vec<CachedStack>>,
}

impl Generation {
    fn new(id: u64, layers: Vec<Middleware>) -> Self {
        Self {
            id,
            layers,
            idle: Mutex::new(Vec::new()),
        }
    }

    fn idle(&self) -> MutexGuard<'_, Vec<CachedStack>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An ordered, mutable list of middleware around an innermost handler.
///
/// Layers run in the order they were added, outermost first. Mutating the
/// list while requests are in flight is allowed; a request keeps the chain
/// it started with.
pub struct MiddlewareStack {
    lock: Mutex<()>,
    current: ArcSwap<Generation>,
    inner: Arc<dyn Handler>,
    pool_size: usize,
}

impl MiddlewareStack {
    /// An empty stack around `inner`, keeping at most `pool_size` idle
    /// chains.
    pub fn new(inner: Arc<dyn Handler>, pool_size: usize) -> Self {
        Self {
            lock: Mutex::new(()),
            current: ArcSwap::from_pointee(Generation::new(0, Vec::new())),
            inner,
            pool_size,
        }
    }

    /// Append a layer. It runs inside every layer added before it.
    pub fn use_middleware(&self, middleware: Middleware) {
        let _guard = self.writer();
        let current = self.current.load_full();
        let mut layers = current.layers.clone();
        layers.push(middleware);
        self.publish(&current, layers);
    }

    /// Add a layer directly before (outside of) the first layer named
    /// `before`.
    pub fn insert(&self, middleware: Middleware, before: &str) -> Result<(), Error> {
        self.mutate(|layers| {
            let at = position(layers, before)?;
            layers.insert(at, middleware);
            Ok(())
        })
    }

    /// Remove the first layer named `name`.
    pub fn abandon(&self, name: &str) -> Result<(), Error> {
        self.mutate(|layers| {
            let at = position(layers, name)?;
            layers.remove(at);
            Ok(())
        })
    }

    /// Layer names, outermost first.
    pub fn names(&self) -> Vec<String> {
        self.current
            .load()
            .layers
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.current.load().id
    }

    /// Number of idle chains pooled for the current generation.
    pub fn pooled(&self) -> usize {
        self.current.load().idle().len()
    }

    /// Take an idle chain of the current generation, or assemble a new one.
    pub fn alloc(&self) -> CachedStack {
        let generation = self.current.load_full();
        let idle = generation.idle().pop();
        match idle {
            Some(stack) => stack,
            None => self.build(&generation),
        }
    }

    /// Return a chain after its request has completed.
    ///
    /// The chain is pooled only if the middleware list has not changed since
    /// it was built and the pool has room; otherwise it is dropped.
    pub fn release(&self, stack: CachedStack) {
        stack.slot.lock().clear();

        let current = self.current.load();
        if stack.generation != current.id {
            trace!(
                "web: dropping stack of generation {} (current is {})",
                stack.generation,
                current.id
            );
            return;
        }

        let mut idle = current.idle();
        if idle.len() < self.pool_size {
            idle.push(stack);
        }
    }

    fn build(&self, generation: &Generation) -> CachedStack {
        let slot = Arc::new(ContextSlot::default());
        let mut handler = Arc::clone(&self.inner);

        for middleware in generation.layers.iter().rev() {
            handler = match &middleware.layer {
                Layer::Context(wrap) => wrap(handler),
                Layer::Plain(wrap) => {
                    let inner: Arc<dyn HttpHandler> = Arc::new(ToPlain {
                        inner: handler,
                        slot: Arc::clone(&slot),
                    });
                    Arc::new(FromPlain {
                        outer: wrap(inner),
                        slot: Arc::clone(&slot),
                    })
                }
            };
        }

        CachedStack {
            handler,
            slot,
            generation: generation.id,
        }
    }

    fn writer(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change that may fail; on failure the generation is kept.
    fn mutate<F>(&self, change: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Vec<Middleware>) -> Result<(), Error>,
    {
        let _guard = self.writer();
        let current = self.current.load_full();
        let mut layers = current.layers.clone();
        change(&mut layers)?;
        self.publish(&current, layers);
        Ok(())
    }

    /// Start the generation after `previous`. Callers hold the writer lock.
    fn publish(&self, previous: &Generation, layers: Vec<Middleware>) {
        let next = Generation::new(previous.id + 1, layers);
        debug!(
            "web: middleware stack is now {:?} (generation {})",
            next.layers.iter().map(Middleware::name).collect::<Vec<_>>(),
            next.id
        );
        self.current.store(Arc::new(next));
    }
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("layers", &self.names())
            .field("generation", &self.generation())
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

fn position(layers: &[Middleware], name: &str) -> Result<usize, Error> {
    layers
        .iter()
        .position(|m| m.name == name)
        .ok_or_else(|| Error::UnknownMiddleware(name.to_string()))
}
