use serde_json::Value;

use flashdrop_core::{Item, PurchaseReceipt};

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn item_to_json(item: &Item, orders: i64) -> Value {
    serde_json::json!({
        "id": item.id,
        "name": item.name,
        "description": item.description,
        "image_url": item.image_url,
        "quantity": item.quantity,
        "orders": orders,
    })
}

pub fn receipt_to_json(receipt: &PurchaseReceipt) -> Value {
    serde_json::json!({
        "message": "purchase successful",
        "item_id": receipt.item_id,
        "order_id": receipt.order_id,
    })
}
