//! Schema bootstrap.
//!
//! Idempotent DDL, run once at startup before the first request is served.

use sqlx::PgPool;

use flashdrop_core::DomainResult;

use crate::inventory::map_sqlx_error;

pub async fn ensure_schema(pool: &PgPool) -> DomainResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            image_url TEXT,
            quantity BIGINT NOT NULL CHECK (quantity >= 0)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_items", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id BIGSERIAL PRIMARY KEY,
            item_id TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_orders", e))?;

    tracing::info!("database schema ensured");
    Ok(())
}
