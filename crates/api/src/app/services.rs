use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use flashdrop_core::{DomainError, DomainResult, Item};
use flashdrop_events::BroadcastHub;
use flashdrop_store::{InventoryStore, PurchaseCoordinator, ensure_schema};

use crate::config::Config;

/// Shared service graph: one pool, one store, one hub, one coordinator.
pub struct AppServices {
    store: InventoryStore,
    coordinator: PurchaseCoordinator,
    hub: Arc<BroadcastHub<Item>>,
    item: Item,
}

/// Connect the pool, ensure the schema, seed the configured item, and wire
/// the coordinator to the broadcast hub.
pub async fn build_services(config: &Config) -> DomainResult<AppServices> {
    let pool = PgPoolOptions::new()
        .min_connections(5)
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .map_err(|e| DomainError::unavailable(format!("database connect: {e}")))?;
    tracing::info!("database connection pool created");

    ensure_schema(&pool).await?;

    let store = InventoryStore::new(pool);
    store.seed(&config.item).await?;

    let hub = Arc::new(BroadcastHub::new());
    let coordinator = PurchaseCoordinator::new(store.clone(), hub.clone());

    Ok(AppServices {
        store,
        coordinator,
        hub,
        item: config.item.clone(),
    })
}

impl AppServices {
    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    pub fn coordinator(&self) -> &PurchaseCoordinator {
        &self.coordinator
    }

    pub fn hub(&self) -> &Arc<BroadcastHub<Item>> {
        &self.hub
    }

    /// The configured seed item; its quantity is what reset restores.
    pub fn seed_item(&self) -> &Item {
        &self.item
    }

    /// Close the connection pool. Runs on the graceful-shutdown path; any
    /// call after this sees `Unavailable`.
    pub async fn close(&self) {
        self.store.pool().close().await;
    }
}
