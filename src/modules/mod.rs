pub mod books;

use std::sync::Arc;

use bookapi_kernel::ModuleRegistry;

use books::store::BookStore;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, books: Arc<dyn BookStore>) {
    registry.register(books::create_module(books));
}
