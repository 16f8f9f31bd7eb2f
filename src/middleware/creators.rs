//! Middleware creators and the application's middleware list.
//!
//! # Responsibilities
//! - Produce a fresh middleware instance per request
//! - Keep user middleware in registration order
//! - Place the Router and Endpoints stages (explicitly or implicitly)

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::engine::context::Context;
use crate::engine::error::RequestError;
use crate::middleware::chain::{Middleware, Next};
use crate::middleware::endpoints::EndpointsMiddleware;
use crate::middleware::router::RouterMiddleware;
use crate::routing::Router;

pub trait MiddlewareCreator: Send + Sync {
    fn create(&self, ctx: &Context) -> Result<Box<dyn Middleware>, RequestError>;
}

/// Creates `M::default()` for every request.
pub struct TypeCreator<M> {
    _middleware: PhantomData<fn() -> M>,
}

impl<M> TypeCreator<M> {
    pub fn new() -> Self {
        Self {
            _middleware: PhantomData,
        }
    }
}

impl<M> Default for TypeCreator<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Middleware + Default + 'static> MiddlewareCreator for TypeCreator<M> {
    fn create(&self, _: &Context) -> Result<Box<dyn Middleware>, RequestError> {
        Ok(Box::new(M::default()))
    }
}

/// Creates middleware with a factory that can read the context,
/// e.g. to resolve services from the request scope.
pub struct FactoryCreator<F> {
    factory: F,
}

impl<F> FactoryCreator<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F, M> MiddlewareCreator for FactoryCreator<F>
where
    F: Fn(&Context) -> Result<M, RequestError> + Send + Sync,
    M: Middleware + 'static,
{
    fn create(&self, ctx: &Context) -> Result<Box<dyn Middleware>, RequestError> {
        Ok(Box::new((self.factory)(ctx)?))
    }
}

/// Wraps a closure `|ctx, next| Box::pin(async move { .. })`.
pub struct FnCreator<F> {
    f: Arc<F>,
}

impl<F> FnCreator<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), RequestError>>
        + Send
        + Sync
        + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F> MiddlewareCreator for FnCreator<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), RequestError>>
        + Send
        + Sync
        + 'static,
{
    fn create(&self, _: &Context) -> Result<Box<dyn Middleware>, RequestError> {
        Ok(Box::new(FnMiddleware {
            f: Arc::clone(&self.f),
        }))
    }
}

struct FnMiddleware<F> {
    f: Arc<F>,
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), RequestError>>
        + Send
        + Sync
        + 'static,
{
    async fn invoke(&mut self, ctx: &mut Context, next: Next<'_>) -> Result<(), RequestError> {
        (self.f)(ctx, next).await
    }
}

enum MiddlewareEntry {
    Router,
    Endpoints,
    Custom(Arc<dyn MiddlewareCreator>),
}

/// Ordered middleware registrations of an application.
#[derive(Default)]
pub struct MiddlewareCreators {
    entries: VecDeque<MiddlewareEntry>,
}

impl MiddlewareCreators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, creator: Arc<dyn MiddlewareCreator>) {
        self.entries.push_back(MiddlewareEntry::Custom(creator));
    }

    pub fn add_front(&mut self, creator: Arc<dyn MiddlewareCreator>) {
        self.entries.push_front(MiddlewareEntry::Custom(creator));
    }

    /// Place the routing stage here. Later calls are ignored.
    pub fn add_router(&mut self) {
        if !self.has_router() {
            self.entries.push_back(MiddlewareEntry::Router);
        }
    }

    /// Place the endpoint stage here. Later calls are ignored.
    pub fn add_endpoints(&mut self) {
        if !self.has_endpoints() {
            self.entries.push_back(MiddlewareEntry::Endpoints);
        }
    }

    pub fn has_router(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, MiddlewareEntry::Router))
    }

    pub fn has_endpoints(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, MiddlewareEntry::Endpoints))
    }

    /// Number of registrations, implicit stages excluded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Final chain: the routing stage goes first and the endpoint stage last
    /// unless they were placed explicitly.
    pub fn resolve(mut self, router: Arc<dyn Router>) -> Vec<Arc<dyn MiddlewareCreator>> {
        if !self.has_router() {
            self.entries.push_front(MiddlewareEntry::Router);
        }
        if !self.has_endpoints() {
            self.entries.push_back(MiddlewareEntry::Endpoints);
        }

        self.entries
            .into_iter()
            .map(|entry| match entry {
                MiddlewareEntry::Router => {
                    Arc::new(RouterCreator(Arc::clone(&router))) as Arc<dyn MiddlewareCreator>
                }
                MiddlewareEntry::Endpoints => Arc::new(TypeCreator::<EndpointsMiddleware>::new()),
                MiddlewareEntry::Custom(creator) => creator,
            })
            .collect()
    }
}

struct RouterCreator(Arc<dyn Router>);

impl MiddlewareCreator for RouterCreator {
    fn create(&self, _: &Context) -> Result<Box<dyn Middleware>, RequestError> {
        Ok(Box::new(RouterMiddleware::new(Arc::clone(&self.0))))
    }
}
