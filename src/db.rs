//! SQLite connection pool and schema bootstrap for the member store.
//! The member/embedding tables are a local stand-in for the external
//! member store the rest of the pipeline otherwise treats as read-only.

use sqlx::sqlite::{SqlitePoolOptions, SqliteConnectOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_options)
        .await
}

/// Creates `members` / `member_embeddings` if absent. There is no
/// migrations directory yet, so this runs unconditionally at startup
/// (and in tests) rather than through `sqlx::migrate!`.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            grad_year INTEGER NOT NULL,
            degree TEXT NOT NULL,
            branch TEXT NOT NULL,
            city TEXT NOT NULL,
            organization TEXT NOT NULL,
            designation TEXT NOT NULL,
            skills_json TEXT NOT NULL DEFAULT '[]',
            services_json TEXT NOT NULL DEFAULT '[]',
            turnover_crores REAL,
            contact_phone TEXT,
            contact_email TEXT,
            is_active BOOLEAN NOT NULL DEFAULT 1
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS member_embeddings (
            member_id INTEGER NOT NULL,
            model_tag TEXT NOT NULL,
            dim INTEGER NOT NULL,
            vector BLOB NOT NULL,
            PRIMARY KEY (member_id, model_tag),
            FOREIGN KEY (member_id) REFERENCES members(id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_members_grad_year ON members(grad_year)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_members_city ON members(city)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        bootstrap_schema(&pool).await.unwrap();
        bootstrap_schema(&pool).await.unwrap();
    }
}
