//! `/books` request handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, Method, StatusCode, Uri},
    Json,
};
use bookapi_http::error::AppError;

use super::models::{Book, BookInput};
use super::store::BookStore;

/// Methods accepted on `/books`, reported in the `Allow` header on 405.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";

/// Shared state for the books routes.
#[derive(Clone)]
pub struct BooksState {
    pub store: Arc<dyn BookStore>,
}

/// Query string accepted by `/books`. When `id` repeats, the first value wins.
#[derive(Debug, Default)]
pub struct BookQuery {
    pub id: Option<String>,
}

impl BookQuery {
    pub fn from_uri(uri: &Uri) -> Result<Self, AppError> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).map_err(|err| {
            tracing::debug!(error = %err, "rejecting query string");
            AppError::bad_request("invalid_query", "Invalid query string")
        })?;
        let id = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "id").then_some(value));
        Ok(Self { id })
    }

    /// The `id` parameter, if present and non-empty.
    pub fn id(&self) -> Result<Option<i64>, AppError> {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                AppError::bad_request("invalid_book_id", format!("Invalid book ID '{}'", raw))
            }),
        }
    }

    fn required_id(&self) -> Result<i64, AppError> {
        self.id()?
            .ok_or_else(|| AppError::bad_request("missing_book_id", "Missing book ID"))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BookQuery {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_uri(&parts.uri)
    }
}

fn decode_body(body: &Bytes) -> Result<BookInput, AppError> {
    serde_json::from_slice(body).map_err(|err| {
        tracing::debug!(error = %err, "rejecting book payload");
        AppError::bad_request("invalid_request_body", "Invalid request body")
    })
}

/// `GET /books[?id=N]`: every book, or the matching one, as a JSON array.
///
/// A missing id yields `200 []`, not 404.
pub async fn get_books(
    State(state): State<BooksState>,
    query: BookQuery,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = match query.id()? {
        Some(id) => state
            .store
            .get(id)
            .await
            .map(|book| book.into_iter().collect::<Vec<_>>()),
        None => state.store.list().await,
    }
    .map_err(AppError::internal)?;

    tracing::debug!(returned = books.len(), "books fetched");
    Ok(Json(books))
}

/// `POST /books`: insert and return the stored book with its new id.
pub async fn create_book(
    State(state): State<BooksState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let input = decode_body(&body)?;
    let book = state
        .store
        .create(&input)
        .await
        .map_err(AppError::internal)?;

    tracing::info!(book_id = book.id, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// `PUT /books?id=N`: replace title, author and summary.
pub async fn update_book(
    State(state): State<BooksState>,
    query: BookQuery,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let id = query.required_id()?;
    let input = decode_body(&body)?;

    let affected = state
        .store
        .update(id, &input)
        .await
        .map_err(AppError::internal)?;
    if affected == 0 {
        return Err(AppError::not_found("Book not found"));
    }

    tracing::info!(book_id = id, "book updated");
    Ok(StatusCode::OK)
}

/// `DELETE /books?id=N`
pub async fn delete_book(
    State(state): State<BooksState>,
    query: BookQuery,
) -> Result<StatusCode, AppError> {
    let id = query.required_id()?;

    let affected = state.store.delete(id).await.map_err(AppError::internal)?;
    if affected == 0 {
        return Err(AppError::not_found("Book not found"));
    }

    tracing::info!(book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Any other method on `/books`.
pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::method_not_allowed(method.as_str(), ALLOWED_METHODS)
}
