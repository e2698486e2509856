//! Process startup shared by the `bookapi-app` binary and `bookapi-cli`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bookapi_db::DbPool;
use bookapi_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{
    self,
    books::{
        instrumented::InstrumentedBookStore,
        store::{BookStore, PgBookStore},
    },
};

/// Build the module registry over the given book gateway.
pub fn build_registry(books: Arc<dyn BookStore>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, books);
    registry
}

/// Connect to PostgreSQL and verify the connection.
pub async fn connect(settings: &Settings) -> anyhow::Result<DbPool> {
    let pool = bookapi_db::create_pool(&settings.database)
        .await
        .with_context(|| {
            format!(
                "failed to connect to database at {}",
                settings.database.redacted_url()
            )
        })?;

    bookapi_db::health_check(&pool)
        .await
        .with_context(|| "database health check failed")?;

    tracing::info!(db = %settings.database.redacted_url(), "database connection pool ready");
    Ok(pool)
}

/// Apply pending module migrations; returns how many ran.
pub async fn migrate(pool: &DbPool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = bookapi_db::run_migrations(pool, &migrations).await?;
    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

fn postgres_books(pool: &DbPool) -> Arc<dyn BookStore> {
    Arc::new(InstrumentedBookStore::new(PgBookStore::new(pool.clone())))
}

/// Connect and apply pending migrations without serving.
pub async fn run_migrations(settings: &Settings) -> anyhow::Result<usize> {
    let pool = connect(settings).await?;
    let registry = build_registry(postgres_books(&pool));
    let applied = migrate(&pool, &registry).await;
    pool.close().await;
    applied
}

/// Run the service until SIGINT/SIGTERM.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.redacted_url(),
        "bookapi bootstrap starting"
    );

    let pool = connect(settings).await?;
    let registry = build_registry(postgres_books(&pool));

    if settings.database.run_migrations {
        migrate(&pool, &registry).await?;
    }

    let ctx = InitCtx { settings };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;
    tracing::info!("bookapi bootstrap complete");

    let served =
        bookapi_http::start_server(&registry, settings, bookapi_http::shutdown_signal()).await;

    registry.stop_modules().await?;
    let grace = Duration::from_secs(settings.server.shutdown_grace_secs);
    bookapi_db::close_pool(&pool, grace).await;
    tracing::info!("bookapi stopped");

    served
}
