//! Request metrics for `/books`, kept out of the handler bodies.

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use bookapi_telemetry::{metrics, TimingGuard};

use super::handlers::BookQuery;
use super::models::BookOperation;

const UNSUPPORTED: &str = "unsupported";

/// Which book operation a request targets, from its method and `id` parameter.
pub fn classify(method: &Method, has_id: bool) -> Option<BookOperation> {
    match *method {
        Method::GET if has_id => Some(BookOperation::GetById),
        Method::GET => Some(BookOperation::GetAll),
        Method::POST => Some(BookOperation::Create),
        Method::PUT => Some(BookOperation::Update),
        Method::DELETE => Some(BookOperation::Delete),
        _ => None,
    }
}

/// Outcome label for a response status.
pub fn outcome(status: StatusCode) -> &'static str {
    match status {
        s if s.is_success() => "success",
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::METHOD_NOT_ALLOWED => "method_not_allowed",
        _ => "internal_error",
    }
}

/// Count and time every `/books` request by operation and outcome.
pub async fn record_request_metrics(request: Request, next: Next) -> Response {
    let has_id = BookQuery::from_uri(request.uri())
        .map(|query| matches!(query.id(), Ok(Some(_)) | Err(_)))
        .unwrap_or(false);
    let label = classify(request.method(), has_id).map_or(UNSUPPORTED, BookOperation::as_str);

    let _timer = TimingGuard::new(move |elapsed| {
        metrics::observe_book_request_duration(label, elapsed)
    });

    let response = next.run(request).await;
    metrics::record_book_request(label, outcome(response.status()));
    response
}
