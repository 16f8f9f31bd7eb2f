//! Middleware trait and continuation.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::engine::context::Context;
use crate::engine::error::RequestError;
use crate::middleware::creators::MiddlewareCreator;

#[async_trait]
pub trait Middleware: Send {
    /// Handle the request. Call `next.run(ctx).await` to continue the chain;
    /// code after it runs once the rest of the chain has finished.
    async fn invoke(&mut self, ctx: &mut Context, next: Next<'_>) -> Result<(), RequestError>;
}

/// Continuation into the rest of the chain.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn MiddlewareCreator>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(remaining: &'a [Arc<dyn MiddlewareCreator>]) -> Self {
        Self { remaining }
    }

    /// Number of middleware still to run.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Create and invoke the next middleware. A no-op at the end of the chain.
    pub fn run<'c>(self, ctx: &'c mut Context) -> BoxFuture<'c, Result<(), RequestError>>
    where
        'a: 'c,
    {
        Box::pin(async move {
            let Some((creator, rest)) = self.remaining.split_first() else {
                return Ok(());
            };
            let mut middleware = creator.create(ctx)?;
            middleware.invoke(ctx, Next::new(rest)).await
        })
    }
}

/// The resolved, ordered chain for an application.
#[derive(Clone)]
pub struct Pipeline {
    creators: Vec<Arc<dyn MiddlewareCreator>>,
}

impl Pipeline {
    pub fn new(creators: Vec<Arc<dyn MiddlewareCreator>>) -> Self {
        Self { creators }
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }

    pub async fn run(&self, ctx: &mut Context) -> Result<(), RequestError> {
        Next::new(&self.creators).run(ctx).await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("middlewares", &self.creators.len())
            .finish()
    }
}
