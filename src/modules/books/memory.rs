use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::models::{Book, BookInput};
use super::store::{BookStore, StoreError};

/// In-process gateway with the same contract as [`super::store::PgBookStore`].
///
/// Ids start at 1 and are never reused, like a `BIGSERIAL` column.
#[derive(Default)]
pub struct MemoryBookStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    books: BTreeMap<i64, Book>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        // A poisoned lock only means another test thread panicked mid-write.
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.with_state(|state| state.books.values().cloned().collect()))
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError> {
        Ok(self.with_state(|state| state.books.get(&id).cloned()))
    }

    async fn create(&self, input: &BookInput) -> Result<Book, StoreError> {
        Ok(self.with_state(|state| {
            state.last_id += 1;
            let book = input.clone().into_book(state.last_id);
            state.books.insert(book.id, book.clone());
            book
        }))
    }

    async fn update(&self, id: i64, input: &BookInput) -> Result<u64, StoreError> {
        Ok(self.with_state(|state| match state.books.get_mut(&id) {
            Some(book) => {
                *book = input.clone().into_book(id);
                1
            }
            None => 0,
        }))
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        Ok(self.with_state(|state| u64::from(state.books.remove(&id).is_some())))
    }
}
