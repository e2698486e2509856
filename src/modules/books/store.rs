//! Persistence gateway for the `books` table.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::models::{Book, BookInput};

/// Column list for `books` queries.
const BOOK_COLUMNS: &str = "id, title, author, summary";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Gateway failures. Both surface as a 500; the split is kept for logs and metrics.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("row decode failed: {0}")]
    Decode(#[source] BoxError),
}

impl StoreError {
    /// Outcome label for metrics and span attributes.
    pub fn outcome(&self) -> &'static str {
        match self {
            StoreError::Query(_) => "query_failed",
            StoreError::Decode(_) => "decode_failed",
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. } => StoreError::Decode(Box::new(err)),
            other => StoreError::Query(other),
        }
    }
}

/// The four CRUD statements behind the `/books` handlers.
///
/// Every method issues at most one statement. `update` and `delete` report the
/// affected-row count so callers can tell "not found" from success.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError>;

    /// Insert a new row and return it with the database-assigned id.
    async fn create(&self, input: &BookInput) -> Result<Book, StoreError>;

    async fn update(&self, id: i64, input: &BookInput) -> Result<u64, StoreError>;

    async fn delete(&self, id: i64) -> Result<u64, StoreError>;
}

#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    summary: Option<Vec<u8>>,
}

impl TryFrom<BookRow> for Book {
    type Error = StoreError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let summary = match row.summary {
            Some(bytes) => String::from_utf8(bytes).map_err(|e| StoreError::Decode(Box::new(e)))?,
            None => String::new(),
        };

        Ok(Book {
            id: row.id,
            title: row.title,
            author: row.author,
            summary,
        })
    }
}

/// PostgreSQL-backed gateway over a shared `PgPool`.
#[derive(Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books");
        let rows = sqlx::query_as::<_, BookRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1");
        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Book::try_from).transpose()
    }

    async fn create(&self, input: &BookInput) -> Result<Book, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO books (title, author, summary) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.author)
        .bind(input.summary.as_bytes())
        .fetch_one(&self.pool)
        .await?;

        Ok(input.clone().into_book(id))
    }

    async fn update(&self, id: i64, input: &BookInput) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE books SET title = $1, author = $2, summary = $3 WHERE id = $4")
                .bind(&input.title)
                .bind(&input.author)
                .bind(input.summary.as_bytes())
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
