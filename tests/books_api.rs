//! Integration tests for the `/books` and `/healthz` endpoints.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::{header, Method, StatusCode};
use common::{
    body_books, body_bytes, body_json, build_test_app, delete, get, memory_app, post_json,
    put_json, send, UnreachableStore,
};

const DUNE: &str = r#"{"title":"Dune","author":"Frank Herbert","summary":"Desert planet"}"#;

// ---------------------------------------------------------------------------
// Listing and fetching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_catalogue_lists_as_empty_array() {
    let response = get(memory_app(), "/books").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_bytes(response).await, b"[]");
}

#[tokio::test]
async fn create_get_delete_walkthrough() {
    let app = memory_app();

    let response = post_json(app.clone(), "/books", r#"{"title":"A","author":"B","summary":"C"}"#).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"id": 1, "title": "A", "author": "B", "summary": "C"})
    );

    let response = get(app.clone(), "/books?id=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!([{"id": 1, "title": "A", "author": "B", "summary": "C"}])
    );

    let response = delete(app.clone(), "/books?id=1").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());

    let response = get(app, "/books?id=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"[]");
}

#[tokio::test]
async fn created_book_reads_back_with_assigned_id() {
    let app = memory_app();

    let created = body_json(post_json(app.clone(), "/books", DUNE).await).await;
    let id = created["id"].as_i64().expect("server-assigned id");

    let books = body_books(get(app, &format!("/books?id={id}")).await).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, id);
    assert_eq!(books[0].title, "Dune");
    assert_eq!(books[0].author, "Frank Herbert");
    assert_eq!(books[0].summary, "Desert planet");
}

#[tokio::test]
async fn get_by_unknown_id_is_empty_not_404() {
    let response = get(memory_app(), "/books?id=404").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"[]");
}

#[tokio::test]
async fn empty_id_lists_everything() {
    let app = memory_app();
    post_json(app.clone(), "/books", DUNE).await;

    let books = body_books(get(app, "/books?id=").await).await;
    assert_eq!(books.len(), 1);
}

#[tokio::test]
async fn non_numeric_id_is_rejected() {
    let response = get(memory_app(), "/books?id=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_book_id");
}

#[tokio::test]
async fn list_reflects_creates_and_deletes() {
    let app = memory_app();
    let mut ids = Vec::new();
    for n in 0..5 {
        let body = format!(r#"{{"title":"Book {n}","author":"Author {n}","summary":""}}"#);
        let created = body_json(post_json(app.clone(), "/books", &body).await).await;
        ids.push(created["id"].as_i64().unwrap());
    }

    for id in &ids[..2] {
        let response = delete(app.clone(), &format!("/books?id={id}")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let updated = r#"{"title":"Book 4 (2nd ed.)","author":"Author 4","summary":"revised"}"#;
    let response = put_json(app.clone(), &format!("/books?id={}", ids[4]), updated).await;
    assert_eq!(response.status(), StatusCode::OK);

    let books = body_books(get(app, "/books").await).await;
    assert_eq!(books.len(), 3);
    let last = books.iter().find(|b| b.id == ids[4]).unwrap();
    assert_eq!(last.title, "Book 4 (2nd ed.)");
    assert_eq!(last.summary, "revised");
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_json_is_rejected_and_creates_nothing() {
    let app = memory_app();

    let response = post_json(app.clone(), "/books", r#"{"title": "Dune", "#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "invalid_request_body"
    );

    let response = post_json(app.clone(), "/books", r#"{"title":["Dune"]}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app.clone(), "/books", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(body_bytes(get(app, "/books").await).await, b"[]");
}

#[tokio::test]
async fn missing_or_null_fields_store_as_empty() {
    let app = memory_app();

    let response = post_json(app.clone(), "/books", r#"{"author":"B","summary":"C"}"#).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"id": 1, "title": "", "author": "B", "summary": "C"})
    );

    let response = post_json(
        app.clone(),
        "/books",
        r#"{"title":"A","author":"B","summary":null}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["summary"], "");

    assert_eq!(body_books(get(app, "/books").await).await.len(), 2);
}

#[tokio::test]
async fn client_supplied_id_is_ignored_on_create() {
    let app = memory_app();
    let response = post_json(
        app,
        "/books",
        r#"{"id":77,"title":"Dune","author":"Frank Herbert","summary":""}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["id"], 1);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
    let app = memory_app();

    let handles: Vec<_> = (0..32)
        .map(|n| {
            let app = app.clone();
            tokio::spawn(async move {
                let body = format!(r#"{{"title":"T{n}","author":"A{n}","summary":"S{n}"}}"#);
                let response = post_json(app, "/books", &body).await;
                assert_eq!(response.status(), StatusCode::CREATED);
                body_json(response).await["id"].as_i64().unwrap()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap()), "duplicate id issued");
    }
    assert_eq!(ids.len(), 32);

    let books = body_books(get(app, "/books").await).await;
    assert_eq!(books.len(), 32);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_replaces_whole_record_and_is_idempotent() {
    let app = memory_app();
    post_json(app.clone(), "/books", DUNE).await;

    let replacement = r#"{"title":"Dune Messiah","author":"Frank Herbert"}"#;
    for _ in 0..2 {
        let response = put_json(app.clone(), "/books?id=1", replacement).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
    }

    let books = body_books(get(app, "/books?id=1").await).await;
    assert_eq!(books[0].title, "Dune Messiah");
    assert_eq!(books[0].summary, "", "update is not a merge");
}

#[tokio::test]
async fn update_requires_id() {
    let response = put_json(memory_app(), "/books", DUNE).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "missing_book_id");
}

#[tokio::test]
async fn update_rejects_malformed_body() {
    let app = memory_app();
    post_json(app.clone(), "/books", DUNE).await;

    let response = put_json(app.clone(), "/books?id=1", "not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let books = body_books(get(app, "/books?id=1").await).await;
    assert_eq!(books[0].title, "Dune");
}

#[tokio::test]
async fn update_unknown_id_is_404_and_changes_nothing() {
    let app = memory_app();
    post_json(app.clone(), "/books", DUNE).await;

    let response = put_json(app.clone(), "/books?id=99", DUNE).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["message"], "Book not found");

    let books = body_books(get(app, "/books").await).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, 1);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_requires_id() {
    let response = delete(memory_app(), "/books").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_id_uses_first_value() {
    let app = memory_app();
    post_json(app.clone(), "/books", DUNE).await;

    let response = delete(app.clone(), "/books?id=1&id=2").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(body_bytes(get(app, "/books").await).await, b"[]");
}

#[tokio::test]
async fn delete_unknown_id_is_404_and_changes_nothing() {
    let app = memory_app();
    post_json(app.clone(), "/books", DUNE).await;

    let response = delete(app.clone(), "/books?id=2").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(body_books(get(app, "/books").await).await.len(), 1);
}

// ---------------------------------------------------------------------------
// Routing, errors, health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsupported_method_is_405() {
    let response = send(memory_app(), Method::PATCH, "/books", Some(DUNE)).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.headers()[header::ALLOW],
        "GET, POST, PUT, DELETE"
    );
    assert_eq!(
        body_json(response).await["error"]["code"],
        "method_not_allowed"
    );

    for uri in ["/books", "/books?id=1"] {
        let response = send(memory_app(), Method::HEAD, uri, None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers()[header::ALLOW],
            "GET, POST, PUT, DELETE"
        );
    }
}

#[tokio::test]
async fn persistence_failures_are_opaque_500s() {
    let app = build_test_app(Arc::new(UnreachableStore));

    for response in [
        get(app.clone(), "/books").await,
        get(app.clone(), "/books?id=1").await,
        post_json(app.clone(), "/books", DUNE).await,
        put_json(app.clone(), "/books?id=1", DUNE).await,
        delete(app.clone(), "/books?id=1").await,
    ] {
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "internal_error");
        let rendered = json.to_string();
        assert!(!rendered.contains("UTF-8"));
        assert!(!rendered.contains("pool"));
    }
}

#[tokio::test]
async fn client_errors_win_over_persistence_failures() {
    let app = build_test_app(Arc::new(UnreachableStore));

    let response = post_json(app.clone(), "/books", "{").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = delete(app, "/books").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn healthz_ignores_database_state() {
    let app = build_test_app(Arc::new(UnreachableStore));
    let response = get(app, "/healthz").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = get(memory_app(), "/books").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = get(memory_app(), "/authors").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_describes_books() {
    let response = get(memory_app(), "/docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    for method in ["get", "post", "put", "delete"] {
        assert!(
            json["paths"]["/books"][method].is_object(),
            "missing {method} /books"
        );
    }
    assert!(json["components"]["schemas"]["Book"].is_object());
}
