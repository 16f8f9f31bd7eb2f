//! Handler adapters.
//!
//! Async functions whose arguments all implement [`FromContext`] (up to eight)
//! and sync functions taking `&mut Context` both implement [`Handler`]. The
//! `Args` parameter only disambiguates the impls.

use std::future::Future;
use std::marker::PhantomData;

use futures_util::future::{self, BoxFuture};

use crate::engine::binding::FromContext;
use crate::engine::context::Context;
use crate::engine::endpoint::Action;
use crate::engine::error::RequestError;
use crate::http::results::IntoResult;

pub trait Handler<Args>: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), RequestError>>;
}

/// Marker for handlers that take the context itself.
pub struct WithContext;

impl<F, R> Handler<WithContext> for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoResult,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), RequestError>> {
        let outcome = self(ctx).write_to(ctx.response_mut());
        Box::pin(future::ready(outcome))
    }
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoResult + Send + 'static,
            $($ty: FromContext + Send + 'static,)*
        {
            fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), RequestError>> {
                Box::pin(async move {
                    $(let $ty = $ty::from_context(ctx)?;)*
                    let result = self($($ty),*).await;
                    result.write_to(ctx.response_mut())
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

/// Adapts a [`Handler`] to the type-erased [`Action`].
pub(crate) struct HandlerAction<H, Args> {
    handler: H,
    _args: PhantomData<fn() -> Args>,
}

impl<H, Args> HandlerAction<H, Args> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _args: PhantomData,
        }
    }
}

impl<H, Args> Action for HandlerAction<H, Args>
where
    H: Handler<Args>,
    Args: 'static,
{
    fn execute<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), RequestError>> {
        self.handler.call(ctx)
    }
}
