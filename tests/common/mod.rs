//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use rest_engine::config::EnvironmentOptions;
use rest_engine::http::{Request, Response};
use rest_engine::{WebApplicationBuilder, WebApplicationEngine};
use tokio::net::TcpStream;

/// Builder isolated from the process environment and any appsettings files.
pub fn test_builder() -> WebApplicationBuilder {
    WebApplicationBuilder::new().with_options(EnvironmentOptions {
        prefix: Some("REST_INTEGRATION_TEST_".into()),
        environment_name: Some("Testing".into()),
        content_root_path: Some(std::env::temp_dir().join("rest-engine-integration")),
        ..Default::default()
    })
}

#[allow(dead_code)]
pub fn request(method: Method, uri: &str, headers: &[(&'static str, &str)], body: &[u8]) -> Request {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    Request::new(
        method,
        uri.parse::<Uri>().unwrap(),
        map,
        Bytes::copy_from_slice(body),
    )
}

#[allow(dead_code)]
pub async fn get(engine: &WebApplicationEngine, uri: &str) -> Response {
    engine.handle(request(Method::GET, uri, &[], b"")).await
}

#[allow(dead_code)]
pub fn body_text(response: &Response) -> String {
    String::from_utf8(response.body().to_vec()).unwrap()
}

/// Wait until something accepts connections on `addr`.
#[allow(dead_code)]
pub async fn wait_for_listener(addr: SocketAddr) {
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing listening on {}", addr);
}
