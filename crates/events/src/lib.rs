//! `flashdrop-events` — in-process broadcast of stock updates.
//!
//! One publisher, many subscribers, each with its own unbounded FIFO inbox.
//! Delivery to a subscriber is complete once the message is enqueued, so a
//! slow viewer never holds up the publisher or its peers.

pub mod hub;

pub use hub::{BroadcastHub, HubError, Listener, ListenerId};
