#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use bookapi_app::{bootstrap, Book, BookInput, BookStore, MemoryBookStore, StoreError};
use bookapi_kernel::settings::Settings;

/// Build the full application router over the given gateway, with the same
/// middleware stack production uses.
pub fn build_test_app(store: Arc<dyn BookStore>) -> Router {
    let registry = bootstrap::build_registry(store);
    bookapi_http::build_router(&registry, &Settings::default())
}

/// Router over a fresh in-memory gateway.
pub fn memory_app() -> Router {
    build_test_app(Arc::new(MemoryBookStore::new()))
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: &str) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_books(response: Response<Body>) -> Vec<Book> {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Gateway whose every call fails as if the database were unreachable.
pub struct UnreachableStore;

fn unreachable() -> StoreError {
    StoreError::Query(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl BookStore for UnreachableStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        Err(unreachable())
    }

    async fn get(&self, _id: i64) -> Result<Option<Book>, StoreError> {
        Err(StoreError::Decode("summary is not valid UTF-8".into()))
    }

    async fn create(&self, _input: &BookInput) -> Result<Book, StoreError> {
        Err(unreachable())
    }

    async fn update(&self, _id: i64, _input: &BookInput) -> Result<u64, StoreError> {
        Err(unreachable())
    }

    async fn delete(&self, _id: i64) -> Result<u64, StoreError> {
        Err(unreachable())
    }
}
