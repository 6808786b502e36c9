//! The purchase protocol: exactly one winner per unit of stock.
//!
//! One coordinator instance serves all in-flight purchase attempts. Each
//! attempt runs lock → evaluate → decrement → commit inside its own
//! transaction; the row lock acquired by the locked read totally orders the
//! evaluate steps, so exactly as many attempts decrement as there were units,
//! and everyone else observes zero and is rejected. The broadcast to live
//! viewers happens strictly after commit: a slow or failed publish can never
//! affect a transaction's outcome, and no viewer ever sees state from a
//! transaction that later rolled back.

use std::sync::Arc;

use tracing::instrument;

use flashdrop_core::{DomainError, DomainResult, Item, ItemId, PurchaseReceipt};
use flashdrop_events::BroadcastHub;

use crate::inventory::InventoryStore;

/// Orchestrates purchase attempts and resets against one inventory store,
/// publishing fresh snapshots to the hub after each committed mutation.
#[derive(Debug, Clone)]
pub struct PurchaseCoordinator {
    store: InventoryStore,
    hub: Arc<BroadcastHub<Item>>,
}

impl PurchaseCoordinator {
    pub fn new(store: InventoryStore, hub: Arc<BroadcastHub<Item>>) -> Self {
        Self { store, hub }
    }

    /// One purchase attempt.
    ///
    /// Outcomes: `Ok(receipt)` once the decrement + order append are durably
    /// committed; `NotFound` / `SoldOut` as terminal rejections (rolled back
    /// before reporting); `Busy` when the locked read hit abnormal
    /// contention (the caller may retry). The coordinator never retries on
    /// its own, and a notification failure after commit is logged and
    /// swallowed; the purchase already succeeded.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn purchase(&self, item_id: &ItemId) -> DomainResult<PurchaseReceipt> {
        let mut tx = self.store.begin().await?;

        let quantity = match self.store.quantity_for_update(&mut tx, item_id).await {
            Ok(Some(quantity)) => quantity,
            Ok(None) => {
                self.store.rollback(tx, "purchase/not_found").await;
                return Err(DomainError::NotFound);
            }
            Err(e) => {
                self.store.rollback(tx, "purchase/lock").await;
                return Err(e);
            }
        };

        if quantity == 0 {
            self.store.rollback(tx, "purchase/sold_out").await;
            return Err(DomainError::SoldOut);
        }

        let order = match self.store.sell_one(&mut tx, item_id).await {
            Ok(order) => order,
            Err(e) => {
                self.store.rollback(tx, "purchase/sell").await;
                return Err(e);
            }
        };

        self.store.commit(tx).await?;
        tracing::debug!(order_id = order.id, remaining = quantity - 1, "purchase committed");

        self.notify(item_id).await;

        Ok(PurchaseReceipt {
            item_id: item_id.clone(),
            order_id: order.id,
        })
    }

    /// Restore the item to `quantity` units and clear its order log, then
    /// publish the restored snapshot once.
    #[instrument(skip(self), fields(item_id = %item_id, quantity))]
    pub async fn reset(&self, item_id: &ItemId, quantity: i64) -> DomainResult<()> {
        self.store.reset(item_id, quantity).await?;
        tracing::info!("stock reset");

        self.notify(item_id).await;
        Ok(())
    }

    /// Post-commit fan-out. Skips the snapshot read entirely when nobody is
    /// listening; failures are logged and swallowed because the mutation
    /// this notifies about is already final.
    async fn notify(&self, item_id: &ItemId) {
        if self.hub.is_empty() {
            return;
        }

        match self.store.snapshot(item_id).await {
            Ok(item) => match self.hub.publish(item) {
                Ok(reached) => {
                    tracing::debug!(listeners = reached, "stock update broadcast");
                }
                Err(e) => tracing::warn!("stock update broadcast failed: {e}"),
            },
            Err(e) => tracing::warn!("snapshot for broadcast failed: {e}"),
        }
    }
}
