//! End-to-end request handling through a built application, without sockets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{HeaderValue, Method, StatusCode};
use rest_engine::engine::{
    AuthorizationResult, Claim, Context, FromBody, FromHeader, FromQuery, FromRoute,
    FromServices, Identity, Principal,
};
use rest_engine::http::{Json, Results};
use rest_engine::param_names;
use serde::{Deserialize, Serialize};

mod common;
use common::{body_text, get, request, test_builder};

param_names!(Id => "id", Name => "name", Page => "page", Token => "x-token", Key => "key");

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct NewUser {
    name: String,
}

async fn user_by_id(id: FromRoute<Id, u32>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "id": *id }))
}

async fn current_user() -> &'static str {
    "me"
}

#[tokio::test]
async fn test_typed_route_end_to_end() {
    let mut app = test_builder().build().unwrap();
    app.map_get("/api/users/{id:int}", user_by_id).unwrap();
    let engine = app.into_engine().unwrap();

    let ok = get(&engine, "/api/users/12").await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_text(&ok), r#"{"id":12}"#);

    let miss = get(&engine, "/api/users/notanumber").await;
    assert_eq!(miss.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_path_is_percent_decoded_before_routing() {
    async fn hello(name: FromRoute<Name, String>) -> String {
        format!("Hello {}", name.into_inner())
    }

    let mut app = test_builder().build().unwrap();
    app.map_get("/hello/{name}", hello).unwrap();
    app.map_get("/menu/café", || async { "menu" }).unwrap();
    let engine = app.into_engine().unwrap();

    let greeting = get(&engine, "/hello/John%20Doe").await;
    assert_eq!(greeting.status(), StatusCode::OK);
    assert_eq!(body_text(&greeting), "Hello John Doe");

    let menu = get(&engine, "/menu/caf%C3%A9").await;
    assert_eq!(menu.status(), StatusCode::OK);
    assert_eq!(body_text(&menu), "menu");
}

#[tokio::test]
async fn test_literal_beats_parameter() {
    let mut app = test_builder().build().unwrap();
    app.map_get("/api/users/{id}", user_by_id).unwrap();
    app.map_get("/api/users/me", current_user).unwrap();
    let engine = app.into_engine().unwrap();

    assert_eq!(body_text(&get(&engine, "/api/users/me").await), "me");
    assert_eq!(body_text(&get(&engine, "/api/users/3").await), r#"{"id":3}"#);
}

#[tokio::test]
async fn test_method_mismatch_is_404() {
    let mut app = test_builder().build().unwrap();
    app.map_post("/api/users", || async { StatusCode::CREATED }).unwrap();
    let engine = app.into_engine().unwrap();

    assert_eq!(get(&engine, "/api/users").await.status(), StatusCode::NOT_FOUND);
    let created = engine.handle(request(Method::POST, "/api/users", &[], b"")).await;
    assert_eq!(created.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_query_header_and_body_binding() {
    async fn create(
        token: FromHeader<Token>,
        page: FromQuery<Page, Option<u32>>,
        body: FromBody<NewUser>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "token": token.into_inner(),
                "page": *page,
                "name": body.0.name,
            })),
        )
    }

    let mut app = test_builder().build().unwrap();
    app.map_post("/users", create).unwrap();
    let engine = app.into_engine().unwrap();

    let response = engine
        .handle(request(
            Method::POST,
            "/users?page=4",
            &[("x-token", "abc")],
            br#"{"name":"Ada"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(response.body()).unwrap(),
        serde_json::json!({ "token": "abc", "page": 4, "name": "Ada" })
    );

    let missing_header = engine
        .handle(request(Method::POST, "/users", &[], br#"{"name":"Ada"}"#))
        .await;
    assert_eq!(missing_header.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(&missing_header).contains("x-token"));

    let bad_json = engine
        .handle(request(Method::POST, "/users", &[("x-token", "abc")], b"{"))
        .await;
    assert_eq!(bad_json.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scoped_service_shared_within_request_only() {
    struct RequestState {
        id: usize,
    }

    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);

    let mut builder = test_builder();
    builder
        .services()
        .add_scoped_with::<RequestState, RequestState, _>(move |_| {
            Ok(RequestState {
                id: counter.fetch_add(1, Ordering::SeqCst),
            })
        })
        .unwrap();
    let mut app = builder.build().unwrap();
    app.map_get(
        "/state",
        |a: Arc<RequestState>, b: FromServices<RequestState>| async move {
            format!("{}:{}", a.id, b.id)
        },
    )
    .unwrap();
    let engine = app.into_engine().unwrap();

    assert_eq!(body_text(&get(&engine, "/state").await), "0:0");
    assert_eq!(body_text(&get(&engine, "/state").await), "1:1");
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unregistered_service_is_500() {
    struct Missing;

    let mut app = test_builder().build().unwrap();
    app.map_get("/missing", |_: Arc<Missing>| async { "unreachable" })
        .unwrap();
    let engine = app.into_engine().unwrap();

    let response = get(&engine, "/missing").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn test_middleware_order_and_short_circuit() {
    let mut app = test_builder().build().unwrap();
    app.use_fn(|ctx, next| {
        Box::pin(async move {
            ctx.response_mut()
                .headers_mut()
                .append("x-step", HeaderValue::from_static("outer-before"));
            next.run(ctx).await?;
            ctx.response_mut()
                .headers_mut()
                .append("x-step", HeaderValue::from_static("outer-after"));
            Ok(())
        })
    });
    app.use_fn(|ctx, next| {
        Box::pin(async move {
            if ctx.request().header("x-block").is_some() {
                ctx.response_mut().set_status(StatusCode::TOO_MANY_REQUESTS);
                return Ok(());
            }
            next.run(ctx).await
        })
    });
    app.map_get("/hello", || async { "hello" }).unwrap();
    let engine = app.into_engine().unwrap();

    let passed = get(&engine, "/hello").await;
    assert_eq!(body_text(&passed), "hello");
    let steps: Vec<_> = passed.headers().get_all("x-step").iter().collect();
    assert_eq!(steps, ["outer-before", "outer-after"]);

    let blocked = engine
        .handle(request(Method::GET, "/hello", &[("x-block", "1")], b""))
        .await;
    assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(blocked.body().is_empty());
    assert_eq!(blocked.headers().get_all("x-step").iter().count(), 2);
}

#[tokio::test]
async fn test_middleware_after_endpoints_answers_unmatched() {
    let mut app = test_builder().build().unwrap();
    app.use_endpoints();
    app.use_fn(|ctx, next| {
        Box::pin(async move {
            if ctx.response().status() == StatusCode::NOT_FOUND {
                ctx.response_mut().set_status(StatusCode::OK);
                ctx.response_mut().set_text("fallback");
            }
            next.run(ctx).await
        })
    });
    app.map_get("/known", || async { "known" }).unwrap();
    let engine = app.into_engine().unwrap();

    assert_eq!(body_text(&get(&engine, "/known").await), "known");
    assert_eq!(body_text(&get(&engine, "/unknown").await), "fallback");
}

#[tokio::test]
async fn test_authorizer_uses_principal_from_middleware() {
    let mut app = test_builder().build().unwrap();
    app.use_fn(|ctx, next| {
        Box::pin(async move {
            if let Some(role) = ctx.request().header("x-role").map(str::to_string) {
                ctx.set_principal(Principal::new(Identity::new(
                    "header",
                    vec![Claim::new("role", role)],
                )));
            }
            next.run(ctx).await
        })
    });
    app.map_delete("/users/{key}", |key: FromRoute<Key>| async move {
        Results::text(format!("deleted {}", *key), "text/plain")
    })
    .unwrap()
    .add_authorizer(|ctx: &Context| {
        if ctx.principal().is_in_role("admin") {
            AuthorizationResult::allow()
        } else {
            AuthorizationResult::deny("admin role required")
        }
    });
    let engine = app.into_engine().unwrap();

    let denied = engine
        .handle(request(Method::DELETE, "/users/ada", &[("x-role", "viewer")], b""))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(&denied), "admin role required");

    let allowed = engine
        .handle(request(Method::DELETE, "/users/ada", &[("x-role", "admin")], b""))
        .await;
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(body_text(&allowed), "deleted ada");
}

#[tokio::test]
async fn test_handler_panic_is_contained() {
    let mut app = test_builder().build().unwrap();
    app.map_get("/panic", |ctx: &mut Context| -> &'static str {
        if ctx.request().path() == "/panic" {
            panic!("boom");
        }
        "fine"
    })
    .unwrap();
    app.map_get("/after", || async { "still serving" }).unwrap();
    let engine = app.into_engine().unwrap();

    assert_eq!(
        get(&engine, "/panic").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(body_text(&get(&engine, "/after").await), "still serving");
}
