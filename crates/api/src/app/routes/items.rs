use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use flashdrop_core::ItemId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/status/:id", get(status))
        .route("/buy/:id", post(buy))
        .route("/reset/:id", post(reset))
}

/// GET /status/:id
///
/// Current item snapshot plus order-log size.
pub async fn status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id = ItemId::from(id);

    let item = match services.store().snapshot(&item_id).await {
        Ok(item) => item,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let orders = match services.store().order_count(&item_id).await {
        Ok(n) => n,
        Err(e) => return errors::domain_error_to_response(e),
    };

    (StatusCode::OK, Json(dto::item_to_json(&item, orders))).into_response()
}

/// POST /buy/:id
///
/// One purchase attempt; at most `quantity` callers ever get a 200 for a
/// given stock level.
pub async fn buy(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id = ItemId::from(id);

    match services.coordinator().purchase(&item_id).await {
        Ok(receipt) => (StatusCode::OK, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /reset/:id
///
/// Restore the configured quantity and clear the order log.
pub async fn reset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id = ItemId::from(id);
    let quantity = services.seed_item().quantity;

    match services.coordinator().reset(&item_id, quantity).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "stock reset",
                "item_id": item_id,
                "quantity": quantity,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
