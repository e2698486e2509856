//! PostgreSQL pool factory and module migration runner.

use std::time::Duration;

use anyhow::Context;
use bookapi_kernel::settings::DatabaseSettings;
use bookapi_kernel::Migration;
use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Ledger of applied module migrations.
const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS bookapi_migrations (
    module TEXT NOT NULL,
    id TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (module, id)
)";

/// Advisory lock key serialising concurrent migration runs.
const MIGRATION_LOCK_KEY: i64 = 0x626f_6f6b_6170_69;

/// Create a connection pool from the database settings.
///
/// Connects eagerly so a bad URL fails at startup rather than on the first request.
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .connect(&settings.url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Close the pool, waiting at most `grace` for checked-out connections.
///
/// Returns `false` when connections were still busy at the deadline; they are
/// released when their request tasks finish or the process exits.
pub async fn close_pool(pool: &DbPool, grace: Duration) -> bool {
    match tokio::time::timeout(grace, pool.close()).await {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!(
                target: "bookapi-db",
                grace_secs = grace.as_secs_f64(),
                "connections still in use after shutdown grace period"
            );
            false
        }
    }
}

/// Apply every migration not yet recorded in the ledger.
///
/// Each migration runs in its own transaction together with its ledger row.
/// Returns the number of migrations applied.
pub async fn run_migrations(
    pool: &DbPool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    let mut conn = pool
        .acquire()
        .await
        .context("failed to acquire connection for migrations")?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .context("failed to take migration lock")?;

    let result = apply_pending(&mut *conn, migrations).await;

    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .context("failed to release migration lock")?;

    result
}

async fn apply_pending(
    conn: &mut sqlx::PgConnection,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::raw_sql(LEDGER_DDL)
        .execute(&mut *conn)
        .await
        .context("failed to create migration ledger")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bookapi_migrations WHERE module = $1 AND id = $2)",
        )
        .bind(module)
        .bind(migration.id)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to read ledger for {}/{}", module, migration.id))?;

        if exists {
            tracing::debug!(target: "bookapi-db", module = %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = sqlx::Connection::begin(&mut *conn).await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO bookapi_migrations (module, id) VALUES ($1, $2)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "bookapi-db", module = %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
