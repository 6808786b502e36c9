//! `flashdrop-store` — Postgres-backed inventory and the purchase protocol.
//!
//! The store exposes the transactional primitives (locked read, decrement +
//! order append, snapshot, reset); the coordinator layers the
//! exactly-one-winner-per-unit state machine on top and publishes the fresh
//! snapshot to the broadcast hub strictly after commit.

pub mod inventory;
pub mod purchase;
pub mod schema;

pub use inventory::InventoryStore;
pub use purchase::PurchaseCoordinator;
pub use schema::ensure_schema;
