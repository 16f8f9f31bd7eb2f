//! Handler parameter binding.
//!
//! # Responsibilities
//! - Resolve each handler argument independently from the context
//! - Convert raw route/query/header/cookie strings into typed values
//! - Deserialize JSON bodies
//! - Pull services from the request scope
//!
//! # Extractors
//! ```text
//! FromRoute<N, T>     route parameter N           Option<T> when optional
//! FromQuery<N, T>     query parameter N
//! FromHeader<N, T>    header N (case-insensitive)
//! Cookie<N, T>        cookie N
//! FromBody<T>         JSON body (String = raw text, Value = raw JSON)
//! FromServices<I>     get_required_service::<I>()   also plain Arc<I>
//! FromServicesAll<I>  get_services::<I>()
//! Transient<I>        create_required_service::<I>()
//! TransientAll<I>     create_services::<I>()
//! TraceId, Method, HeaderMap, Principal
//! ```
//!
//! Parameter names are types implementing [`ParamName`], usually declared
//! with [`param_names!`](crate::param_names).

use std::any::Any;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

use crate::engine::context::Context;
use crate::engine::error::{BindingError, ParamSource, RequestError};
use crate::engine::principal::Principal;

/// A value that can be produced from the request context.
pub trait FromContext: Sized {
    fn from_context(ctx: &Context) -> Result<Self, RequestError>;
}

/// Compile-time parameter name.
pub trait ParamName {
    const NAME: &'static str;
}

/// Declare parameter name marker types.
///
/// ```ignore
/// param_names!(Id => "id", Page => "page");
/// async fn get_user(id: FromRoute<Id, i64>, page: FromQuery<Page, Option<u32>>) { .. }
/// ```
#[macro_export]
macro_rules! param_names {
    ($($vis:vis $ty:ident => $name:literal),+ $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy)]
            $vis struct $ty;

            impl $crate::engine::binding::ParamName for $ty {
                const NAME: &'static str = $name;
            }
        )+
    };
}

/// A value parsed from a single raw parameter string.
pub trait ParamValue: Sized {
    /// Type description used in binding errors.
    fn expected() -> &'static str;

    fn parse_param(raw: &str) -> Option<Self>;

    /// Value used when the parameter is absent. `None` means required.
    fn absent() -> Option<Self> {
        None
    }
}

macro_rules! impl_param_value {
    ($($ty:ty),+) => {
        $(
            impl ParamValue for $ty {
                fn expected() -> &'static str {
                    stringify!($ty)
                }

                fn parse_param(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )+
    };
}

impl_param_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char);

impl ParamValue for String {
    fn expected() -> &'static str {
        "string"
    }

    fn parse_param(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl ParamValue for bool {
    fn expected() -> &'static str {
        "bool"
    }

    /// `true`/`false` in any case, or an integer (non-zero is true).
    fn parse_param(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("true") {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            raw.parse::<i64>().ok().map(|n| n != 0)
        }
    }
}

impl<T: ParamValue> ParamValue for Option<T> {
    fn expected() -> &'static str {
        T::expected()
    }

    fn parse_param(raw: &str) -> Option<Self> {
        T::parse_param(raw).map(Some)
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

fn bind<N: ParamName, T: ParamValue>(
    location: ParamSource,
    raw: Option<&str>,
) -> Result<T, BindingError> {
    match raw {
        Some(value) => T::parse_param(value).ok_or_else(|| BindingError::Invalid {
            location,
            name: N::NAME,
            value: value.to_string(),
            expected: T::expected(),
        }),
        None => T::absent().ok_or(BindingError::Missing {
            location,
            name: N::NAME,
        }),
    }
}

macro_rules! param_extractor {
    ($(#[$doc:meta])* $name:ident, $source:expr, |$ctx:ident, $key:ident| $lookup:expr) => {
        $(#[$doc])*
        pub struct $name<N, T = String>(pub T, PhantomData<fn() -> N>);

        impl<N, T> $name<N, T> {
            pub fn into_inner(self) -> T {
                self.0
            }
        }

        impl<N, T> Deref for $name<N, T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.0
            }
        }

        impl<N, T> DerefMut for $name<N, T> {
            fn deref_mut(&mut self) -> &mut T {
                &mut self.0
            }
        }

        impl<N: ParamName, T: std::fmt::Debug> std::fmt::Debug for $name<N, T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&N::NAME).field(&self.0).finish()
            }
        }

        impl<N: ParamName, T: ParamValue> FromContext for $name<N, T> {
            fn from_context($ctx: &Context) -> Result<Self, RequestError> {
                let $key = N::NAME;
                let value = bind::<N, T>($source, $lookup)?;
                Ok(Self(value, PhantomData))
            }
        }
    };
}

param_extractor!(
    /// Matched route parameter `N`.
    FromRoute,
    ParamSource::Route,
    |ctx, key| ctx.routing().params().get(key)
);

param_extractor!(
    /// First query string value of `N`.
    FromQuery,
    ParamSource::Query,
    |ctx, key| ctx.request().query().get(key)
);

param_extractor!(
    /// First value of header `N`.
    FromHeader,
    ParamSource::Header,
    |ctx, key| ctx.request().header(key)
);

param_extractor!(
    /// Cookie `N`.
    Cookie,
    ParamSource::Cookie,
    |ctx, key| ctx.request().cookies().get(key)
);

/// Request body. JSON for most types; `String` takes the raw text.
#[derive(Debug, Clone)]
pub struct FromBody<T>(pub T);

impl<T> FromBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for FromBody<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: DeserializeOwned + 'static> FromContext for FromBody<T> {
    fn from_context(ctx: &Context) -> Result<Self, RequestError> {
        let body = ctx.request().body();

        if std::any::TypeId::of::<T>() == std::any::TypeId::of::<String>() {
            let text = std::str::from_utf8(body)
                .map_err(|_| BindingError::InvalidUtf8)?
                .to_string();
            let raw: Box<dyn Any> = Box::new(text);
            if let Ok(value) = raw.downcast::<T>() {
                return Ok(Self(*value));
            }
        }

        serde_json::from_slice(body)
            .map(Self)
            .map_err(|e| BindingError::Body(e).into())
    }
}

macro_rules! service_extractor {
    ($(#[$doc:meta])* $name:ident($inner:ty) => $resolve:ident) => {
        $(#[$doc])*
        pub struct $name<I: ?Sized>(pub $inner);

        impl<I: ?Sized> Deref for $name<I> {
            type Target = $inner;

            fn deref(&self) -> &$inner {
                &self.0
            }
        }

        impl<I: ?Sized + Send + Sync + 'static> FromContext for $name<I> {
            fn from_context(ctx: &Context) -> Result<Self, RequestError> {
                Ok(Self(ctx.services().$resolve::<I>()?))
            }
        }
    };
}

service_extractor!(
    /// Required shared service.
    FromServices(Arc<I>) => get_required_service
);

service_extractor!(
    /// Every implementation of `I`, main first.
    FromServicesAll(Vec<Arc<I>>) => get_services
);

service_extractor!(
    /// Fresh caller-owned instance of a transient service.
    Transient(Box<I>) => create_required_service
);

service_extractor!(
    /// Fresh instances of every transient implementation of `I`.
    TransientAll(Vec<Box<I>>) => create_services
);

/// Plain service parameter.
impl<I: ?Sized + Send + Sync + 'static> FromContext for Arc<I> {
    fn from_context(ctx: &Context) -> Result<Self, RequestError> {
        Ok(ctx.services().get_required_service::<I>()?)
    }
}

/// Correlation id of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl FromContext for TraceId {
    fn from_context(ctx: &Context) -> Result<Self, RequestError> {
        Ok(TraceId(ctx.trace_id().to_string()))
    }
}

impl FromContext for Method {
    fn from_context(ctx: &Context) -> Result<Self, RequestError> {
        Ok(ctx.request().method().clone())
    }
}

impl FromContext for HeaderMap {
    fn from_context(ctx: &Context) -> Result<Self, RequestError> {
        Ok(ctx.request().headers().clone())
    }
}

impl FromContext for Principal {
    fn from_context(ctx: &Context) -> Result<Self, RequestError> {
        Ok(ctx.principal().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{DiResult, Injectable, ServiceCollection, ServiceProvider};
    use crate::engine::endpoint::Endpoint;
    use crate::http::request::Request;
    use axum::body::Bytes;
    use axum::http::{StatusCode, Uri};
    use serde::Deserialize;

    crate::param_names!(Id => "id", Page => "page", Token => "x-token", Lang => "lang");

    async fn noop() {}

    fn context(uri: &'static str, headers: HeaderMap, body: &'static [u8]) -> Context {
        let request = Request::new(Method::POST, Uri::from_static(uri), headers, Bytes::from_static(body));
        let mut services = ServiceCollection::new();
        services.add_scoped::<Counter, Counter>().unwrap();
        services.add_transient::<Ticket, Ticket>().unwrap();
        Context::new(request, ServiceProvider::new(services).create_scoped())
    }

    fn routed(template: &str, path: &'static str) -> Context {
        let mut ctx = context(path, HeaderMap::new(), b"");
        let endpoint = Arc::new(Endpoint::new(Method::POST, template, noop).unwrap());
        ctx.routing_mut().set_endpoint(endpoint, path);
        ctx
    }

    struct Counter;

    impl Injectable for Counter {
        fn inject(_: &ServiceProvider) -> DiResult<Self> {
            Ok(Counter)
        }
    }

    struct Ticket;

    impl Injectable for Ticket {
        fn inject(_: &ServiceProvider) -> DiResult<Self> {
            Ok(Ticket)
        }
    }

    fn binding_status<T: FromContext>(ctx: &Context) -> StatusCode {
        match T::from_context(ctx) {
            Ok(_) => StatusCode::OK,
            Err(e) => e.status(),
        }
    }

    #[test]
    fn test_route_parameter() {
        let ctx = routed("/api/users/{id:int}", "/api/users/12");
        let id = FromRoute::<Id, i64>::from_context(&ctx).unwrap();
        assert_eq!(*id, 12);

        assert_eq!(binding_status::<FromRoute<Id, u8>>(&routed("/u/{id}", "/u/300")), StatusCode::BAD_REQUEST);
        assert_eq!(binding_status::<FromRoute<Page, i64>>(&ctx), StatusCode::BAD_REQUEST);
        assert!(FromRoute::<Page, Option<i64>>::from_context(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_query_header_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Token", "secret".parse().unwrap());
        headers.insert("Cookie", "lang=pl".parse().unwrap());
        let ctx = context("/?page=2", headers, b"");

        assert_eq!(*FromQuery::<Page, u32>::from_context(&ctx).unwrap(), 2);
        assert_eq!(FromHeader::<Token, String>::from_context(&ctx).unwrap().into_inner(), "secret");
        assert_eq!(Cookie::<Lang, String>::from_context(&ctx).unwrap().0, "pl");
    }

    #[test]
    fn test_missing_and_invalid_report_names() {
        let ctx = context("/?page=two", HeaderMap::new(), b"");

        match FromQuery::<Page, u32>::from_context(&ctx) {
            Err(RequestError::Binding(BindingError::Invalid { name, value, expected, .. })) => {
                assert_eq!(name, "page");
                assert_eq!(value, "two");
                assert_eq!(expected, "u32");
            }
            _ => panic!("expected invalid binding"),
        }

        match FromHeader::<Token, String>::from_context(&ctx) {
            Err(RequestError::Binding(BindingError::Missing { location, name })) => {
                assert_eq!(location, ParamSource::Header);
                assert_eq!(name, "x-token");
            }
            _ => panic!("expected missing binding"),
        }
    }

    #[test]
    fn test_bool_values() {
        assert_eq!(bool::parse_param("TRUE"), Some(true));
        assert_eq!(bool::parse_param("false"), Some(false));
        assert_eq!(bool::parse_param("0"), Some(false));
        assert_eq!(bool::parse_param("-3"), Some(true));
        assert_eq!(bool::parse_param("yes"), None);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct NewUser {
        name: String,
    }

    #[test]
    fn test_body_variants() {
        let ctx = context("/", HeaderMap::new(), br#"{"name":"Ada"}"#);

        let user = FromBody::<NewUser>::from_context(&ctx).unwrap();
        assert_eq!(user.name, "Ada");

        let raw = FromBody::<String>::from_context(&ctx).unwrap();
        assert_eq!(raw.0, r#"{"name":"Ada"}"#);

        let value = FromBody::<serde_json::Value>::from_context(&ctx).unwrap();
        assert_eq!(value["name"], "Ada");

        let bad = context("/", HeaderMap::new(), b"{not json");
        assert_eq!(binding_status::<FromBody<NewUser>>(&bad), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_service_extractors() {
        let ctx = context("/", HeaderMap::new(), b"");

        let a = FromServices::<Counter>::from_context(&ctx).unwrap();
        let b = Arc::<Counter>::from_context(&ctx).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        assert!(Transient::<Ticket>::from_context(&ctx).is_ok());
        assert_eq!(TransientAll::<Ticket>::from_context(&ctx).unwrap().len(), 1);
        assert_eq!(FromServicesAll::<Counter>::from_context(&ctx).unwrap().len(), 1);

        assert_eq!(binding_status::<Arc<Ticket>>(&ctx), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(binding_status::<FromServices<String>>(&ctx), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
