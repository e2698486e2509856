pub mod handlers;
pub mod instrumented;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{middleware::from_fn, routing::get, Router};
use bookapi_kernel::{InitCtx, Migration, Module};

use handlers::BooksState;
use store::BookStore;

/// CRUD module for the book catalogue, served at `/books`.
pub struct BooksModule {
    store: Arc<dyn BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let state = BooksState {
            store: self.store.clone(),
        };

        Router::new()
            .route(
                "/books",
                get(handlers::get_books)
                    .post(handlers::create_book)
                    .put(handlers::update_book)
                    .delete(handlers::delete_book)
                    .head(handlers::method_not_allowed)
                    .fallback(handlers::method_not_allowed),
            )
            .route_layer(from_fn(middleware::record_request_metrics))
            .with_state(state)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let id_param = |required: bool| {
            serde_json::json!({
                "name": "id",
                "in": "query",
                "required": required,
                "schema": { "type": "integer", "format": "int64" }
            })
        };
        let book_input_body = serde_json::json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookInput" }
                }
            }
        });

        Some(serde_json::json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List books, or fetch one by id",
                        "tags": ["Books"],
                        "parameters": [id_param(false)],
                        "responses": {
                            "200": {
                                "description": "Matching books; empty when none match",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "400": error_response("Invalid book id"),
                            "500": error_response("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_input_body.clone(),
                        "responses": {
                            "201": {
                                "description": "Created book with its assigned id",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "400": error_response("Invalid request body"),
                            "500": error_response("Internal server error")
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "parameters": [id_param(true)],
                        "requestBody": book_input_body,
                        "responses": {
                            "200": { "description": "Book updated" },
                            "400": error_response("Missing id or invalid request body"),
                            "404": error_response("Book not found"),
                            "500": error_response("Internal server error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param(true)],
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "400": error_response("Missing or invalid id"),
                            "404": error_response("Book not found"),
                            "500": error_response("Internal server error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "integer",
                                "format": "int64",
                                "description": "Database-assigned identifier"
                            },
                            "title": { "type": "string", "description": "Title of the book" },
                            "author": { "type": "string", "description": "Author of the book" },
                            "summary": { "type": "string", "description": "UTF-8 summary text" }
                        },
                        "required": ["id", "title", "author", "summary"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "description": "Title of the book" },
                            "author": { "type": "string", "description": "Author of the book" },
                            "summary": { "type": "string", "description": "UTF-8 summary text" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    id      BIGSERIAL PRIMARY KEY,
                    title   TEXT NOT NULL,
                    author  TEXT NOT NULL,
                    summary BYTEA
                );
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module over the given gateway
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
