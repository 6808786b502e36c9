//! Postgres-backed inventory store.
//!
//! Holds the authoritative item quantity and the append-only order log. The
//! store provides primitives only; the purchase protocol (who wins, who is
//! rejected) lives in [`crate::purchase`]. All serialization of concurrent
//! mutation relies on PostgreSQL row locking; the store holds no in-process
//! locks, and no code path mutates `quantity` outside a transaction.
//!
//! ## Error Mapping
//!
//! SQLx errors are classified into `DomainError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | DomainError | Scenario |
//! |------------|----------------------|-------------|----------|
//! | Database | `55P03` (lock_not_available) | `Busy` | Abnormal lock contention on the locked read (surfaced under `lock_timeout`/`NOWAIT` policies) |
//! | PoolClosed / PoolTimedOut | N/A | `Unavailable` | Connection pool closed or exhausted |
//! | Io | N/A | `Unavailable` | Network failure talking to the backend |
//! | Anything else | Any | `Internal` | Unexpected database or decode errors |
//!
//! Only the locked read maps `55P03` to `Busy`; every other operation treats
//! it as unexpected. Business outcomes (`NotFound`, `SoldOut`) are decided by
//! the caller from returned values, never synthesized from SQL errors.

use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::instrument;

use flashdrop_core::{DomainError, DomainResult, Item, ItemId, Order};

/// Open transaction on the inventory database.
pub type InventoryTx = Transaction<'static, Postgres>;

/// Postgres-backed store for the single-item inventory.
///
/// Cheap to clone (shares the connection pool). `Send + Sync`; all methods
/// take `&self` and may run from any task.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    pool: PgPool,
}

impl InventoryStore {
    /// Wrap an already-constructed connection pool.
    ///
    /// The pool is an injected dependency: the binary builds it at startup
    /// and closes it on shutdown; tests build their own.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction for a lock-then-act sequence.
    pub async fn begin(&self) -> DomainResult<InventoryTx> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))
    }

    /// Commit, surfacing failures as domain errors.
    pub async fn commit(&self, tx: InventoryTx) -> DomainResult<()> {
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }

    /// Roll back, logging (not surfacing) failures: the decision that led
    /// here is already final, and a dropped transaction rolls back anyway.
    pub async fn rollback(&self, tx: InventoryTx, context: &str) {
        if let Err(e) = tx.rollback().await {
            tracing::warn!(context, "rollback failed: {e}");
        }
    }

    /// Locked read: acquire an exclusive row lock on the item and return its
    /// quantity, or `None` when the id is unknown.
    ///
    /// Blocks while another transaction holds the lock; PostgreSQL's own
    /// lock-wait policy decides how long. Abnormal contention (`55P03`)
    /// classifies as `Busy`; this is the only place that mapping applies.
    pub async fn quantity_for_update(
        &self,
        tx: &mut InventoryTx,
        item_id: &ItemId,
    ) -> DomainResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT quantity
            FROM items
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(item_id.as_str())
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_lock_error)
    }

    /// Decrement quantity by exactly 1 and append one order row, inside the
    /// caller's transaction. Call only after a locked read observed
    /// quantity > 0 under the same transaction.
    pub async fn sell_one(&self, tx: &mut InventoryTx, item_id: &ItemId) -> DomainResult<Order> {
        let updated = sqlx::query(
            r#"
            UPDATE items
            SET quantity = quantity - 1
            WHERE id = $1
            "#,
        )
        .bind(item_id.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("decrement", e))?
        .rows_affected();

        // Unreachable after a positive locked read; kept as the invariant
        // tripwire for the "committed but nothing sold" class of bug.
        if updated != 1 {
            return Err(DomainError::internal(format!(
                "decrement touched {updated} rows for locked item {item_id}"
            )));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO orders (item_id)
            VALUES ($1)
            RETURNING id, item_id, created_at
            "#,
        )
        .bind(item_id.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("record_order", e))?;

        order_from_row(&row)
    }

    /// Lock-free read of the persisted item state, for status queries and
    /// broadcast payloads.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn snapshot(&self, item_id: &ItemId) -> DomainResult<Item> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, image_url, quantity
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(item_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("snapshot", e))?;

        match row {
            Some(row) => item_from_row(&row),
            None => Err(DomainError::NotFound),
        }
    }

    /// Restore `quantity` and clear the item's order log, atomically.
    #[instrument(skip(self), fields(item_id = %item_id, quantity))]
    pub async fn reset(&self, item_id: &ItemId, quantity: i64) -> DomainResult<()> {
        let mut tx = self.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE items
            SET quantity = $2
            WHERE id = $1
            "#,
        )
        .bind(item_id.as_str())
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("reset_quantity", e))?
        .rows_affected();

        if updated == 0 {
            self.rollback(tx, "reset").await;
            return Err(DomainError::NotFound);
        }

        sqlx::query("DELETE FROM orders WHERE item_id = $1")
            .bind(item_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("reset_orders", e))?;

        self.commit(tx).await
    }

    /// Bootstrap insert; keeps an existing row (and its live quantity)
    /// untouched.
    pub async fn seed(&self, item: &Item) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, description, image_url, quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(item.id.as_str())
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.image_url)
        .bind(item.quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("seed", e))?;

        Ok(())
    }

    /// Size of the item's order log (lock-free).
    pub async fn order_count(&self, item_id: &ItemId) -> DomainResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE item_id = $1")
            .bind(item_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order_count", e))
    }
}

fn item_from_row(row: &PgRow) -> DomainResult<Item> {
    Ok(Item {
        id: ItemId::new(
            row.try_get::<String, _>("id")
                .map_err(|e| decode_error("items.id", e))?,
        ),
        name: row
            .try_get("name")
            .map_err(|e| decode_error("items.name", e))?,
        description: row
            .try_get("description")
            .map_err(|e| decode_error("items.description", e))?,
        image_url: row
            .try_get("image_url")
            .map_err(|e| decode_error("items.image_url", e))?,
        quantity: row
            .try_get("quantity")
            .map_err(|e| decode_error("items.quantity", e))?,
    })
}

fn order_from_row(row: &PgRow) -> DomainResult<Order> {
    Ok(Order {
        id: row.try_get("id").map_err(|e| decode_error("orders.id", e))?,
        item_id: ItemId::new(
            row.try_get::<String, _>("item_id")
                .map_err(|e| decode_error("orders.item_id", e))?,
        ),
        created_at: row
            .try_get("created_at")
            .map_err(|e| decode_error("orders.created_at", e))?,
    })
}

fn decode_error(column: &str, e: sqlx::Error) -> DomainError {
    DomainError::internal(format!("failed to decode {column}: {e}"))
}

/// Classify a SQLx failure from the locked read. `55P03` is the backend
/// refusing to grant the row lock under its wait policy, the one transient,
/// retryable case.
fn map_lock_error(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("55P03") {
            return DomainError::busy(db.message().to_string());
        }
    }
    map_sqlx_error("lock_item", e)
}

pub(crate) fn map_sqlx_error(op: &str, e: sqlx::Error) -> DomainError {
    match e {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            DomainError::unavailable(format!("{op}: {e}"))
        }
        sqlx::Error::Io(e) => DomainError::unavailable(format!("{op}: {e}")),
        other => DomainError::internal(format!("{op}: {other}")),
    }
}
