//! PostgreSQL gateway tests. Run with a reachable database:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use std::sync::Arc;

use bookapi_app::{bootstrap, BookInput, BookStore, PgBookStore, StoreError};
use sqlx::PgPool;

async fn migrated_store(pool: PgPool) -> PgBookStore {
    let store = PgBookStore::new(pool.clone());
    let registry = bootstrap::build_registry(Arc::new(store.clone()));
    bootstrap::migrate(&pool, &registry).await.unwrap();
    store
}

fn input(title: &str, summary: &str) -> BookInput {
    BookInput {
        title: title.to_string(),
        author: "Octavia E. Butler".to_string(),
        summary: summary.to_string(),
    }
}

#[sqlx::test(migrations = false)]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn insert_returns_database_assigned_id(pool: PgPool) {
    let store = migrated_store(pool).await;

    let first = store.create(&input("Kindred", "Dana")).await.unwrap();
    let second = store.create(&input("Dawn", "Lilith")).await.unwrap();
    assert!(first.id > 0);
    assert_ne!(first.id, second.id);

    let fetched = store.get(first.id).await.unwrap().expect("row by returned id");
    assert_eq!(fetched, first);
}

#[sqlx::test(migrations = false)]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn update_and_delete_report_affected_rows(pool: PgPool) {
    let store = migrated_store(pool).await;
    let book = store.create(&input("Parable of the Sower", "")).await.unwrap();

    let replacement = input("Parable of the Talents", "Acorn");
    assert_eq!(store.update(book.id, &replacement).await.unwrap(), 1);
    assert_eq!(store.update(book.id, &replacement).await.unwrap(), 1);
    assert_eq!(store.update(book.id + 1000, &replacement).await.unwrap(), 0);

    let stored = store.get(book.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Parable of the Talents");
    assert_eq!(stored.summary, "Acorn");

    assert_eq!(store.delete(book.id).await.unwrap(), 1);
    assert_eq!(store.delete(book.id).await.unwrap(), 0);
    assert!(store.get(book.id).await.unwrap().is_none());
    assert!(store.list().await.unwrap().is_empty());
}

#[sqlx::test(migrations = false)]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn summary_is_stored_as_bytes(pool: PgPool) {
    let store = migrated_store(pool.clone()).await;
    let book = store.create(&input("Wild Seed", "Anyanwu ✓")).await.unwrap();

    let raw: Option<Vec<u8>> = sqlx::query_scalar("SELECT summary FROM books WHERE id = $1")
        .bind(book.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(raw.as_deref(), Some("Anyanwu ✓".as_bytes()));
}

#[sqlx::test(migrations = false)]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn null_and_invalid_summaries(pool: PgPool) {
    let store = migrated_store(pool.clone()).await;

    let null_id: i64 =
        sqlx::query_scalar("INSERT INTO books (title, author) VALUES ('Fledgling', 'Butler') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(store.get(null_id).await.unwrap().unwrap().summary, "");

    sqlx::query("INSERT INTO books (title, author, summary) VALUES ('Bad', 'Bytes', '\\xfffe'::bytea)")
        .execute(&pool)
        .await
        .unwrap();
    assert!(matches!(store.list().await, Err(StoreError::Decode(_))));
}
