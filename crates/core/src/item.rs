use serde::{Deserialize, Serialize};

/// Item identifier: an immutable, human-readable slug (e.g. `drop-001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The sellable item: one row, one quantity counter.
///
/// `quantity` is mutated exclusively through the purchase coordinator's
/// locked decrement or through reset; it never goes below zero (backed by a
/// CHECK constraint in the schema). This struct doubles as the broadcast
/// payload: each committed purchase publishes a fresh snapshot of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub quantity: i64,
}
