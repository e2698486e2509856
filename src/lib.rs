//! Book catalogue service.
//!
//! Wires the `books` module onto the bookapi kernel and HTTP crates.

pub mod bootstrap;
pub mod modules;

pub use modules::books::{
    memory::MemoryBookStore,
    models::{Book, BookInput},
    store::{BookStore, PgBookStore, StoreError},
};
