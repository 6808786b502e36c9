use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// One completed purchase, appended in the same transaction as the
/// quantity decrement. Never mutated; cleared only by reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Sequence identifier assigned by the store (BIGSERIAL).
    pub id: i64,
    pub item_id: ItemId,
    pub created_at: DateTime<Utc>,
}

/// Confirmation returned to a winning buyer after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub item_id: ItemId,
    pub order_id: i64,
}
