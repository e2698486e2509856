//! Tracing and metrics decorator for any [`BookStore`].

use std::future::Future;

use async_trait::async_trait;
use bookapi_telemetry::{metrics, TimingGuard};
use tracing::{field, Instrument, Span};

use super::models::{Book, BookInput, BookOperation};
use super::store::{BookStore, StoreError};

/// Wraps a gateway with one span and one metric sample per database call.
///
/// Instrumentation never changes the result the inner store returns.
pub struct InstrumentedBookStore<S> {
    inner: S,
}

impl<S: BookStore> InstrumentedBookStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

macro_rules! db_span {
    ($name:literal, $statement:literal) => {
        tracing::info_span!(
            $name,
            db.operation = $statement,
            db.table = "books",
            book.id = field::Empty,
            db.rows = field::Empty,
            error = field::Empty,
            error.message = field::Empty,
        )
    };
}

async fn observe<T, Fut>(
    operation: BookOperation,
    call: Fut,
    rows: impl FnOnce(&T) -> u64,
) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    let label = operation.as_str();
    let _timer = TimingGuard::new(|elapsed| metrics::observe_db_call_duration(label, elapsed));

    let result = call.await;
    let span = Span::current();
    match &result {
        Ok(value) => {
            span.record("db.rows", rows(value));
            metrics::record_db_call(label, "success");
        }
        Err(err) => {
            span.record("error", err.outcome());
            span.record("error.message", field::display(err));
            tracing::warn!(operation = label, error = %err, "database call failed");
            metrics::record_db_call(label, err.outcome());
        }
    }
    result
}

#[async_trait]
impl<S: BookStore> BookStore for InstrumentedBookStore<S> {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let span = db_span!("db.query.get_all_books", "SELECT");
        observe(BookOperation::GetAll, self.inner.list(), |books: &Vec<Book>| {
            books.len() as u64
        })
        .instrument(span)
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let span = db_span!("db.query.get_book_by_id", "SELECT");
        span.record("book.id", id);
        observe(BookOperation::GetById, self.inner.get(id), |book: &Option<Book>| {
            u64::from(book.is_some())
        })
        .instrument(span)
        .await
    }

    async fn create(&self, input: &BookInput) -> Result<Book, StoreError> {
        let span = db_span!("db.insert.book", "INSERT");
        let call = async {
            let book = self.inner.create(input).await?;
            Span::current().record("book.id", book.id);
            Ok::<_, StoreError>(book)
        };
        observe(BookOperation::Create, call, |_: &Book| 1)
            .instrument(span)
            .await
    }

    async fn update(&self, id: i64, input: &BookInput) -> Result<u64, StoreError> {
        let span = db_span!("db.update.book", "UPDATE");
        span.record("book.id", id);
        observe(BookOperation::Update, self.inner.update(id, input), |rows: &u64| *rows)
            .instrument(span)
            .await
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let span = db_span!("db.delete.book", "DELETE");
        span.record("book.id", id);
        observe(BookOperation::Delete, self.inner.delete(id), |rows: &u64| *rows)
            .instrument(span)
            .await
    }
}
