use axum::Router;

pub mod items;
pub mod live;
pub mod system;

/// Router for the item endpoints plus the live feed.
pub fn router() -> Router {
    Router::new().merge(items::router()).merge(live::router())
}
