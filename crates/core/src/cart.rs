//! Cart entries, snapshots and the transitions between them.
//!
//! A [`Snapshot`] is never edited in place. Each operation returns a brand
//! new snapshot (plus the [`Change`] it represents), or `None` when the
//! operation does not apply, so the caller can swap it in wholesale and
//! persist exactly what readers see.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Price, ProductId, Quantity};

/// Errors raised when building a snapshot from untrusted entries.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Two entries share the same product id.
    #[error("duplicate cart entry for product {0}")]
    DuplicateId(ProductId),
}

/// One product line in the cart.
///
/// Field names are the persisted wire names (`image_url` in snake case).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: Quantity,
}

impl CartEntry {
    /// Price of the whole line (`price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    fn with_quantity(&self, quantity: Quantity) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

/// A product being added to the cart: a [`CartEntry`] without quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

impl CartItem {
    /// Create a new cart item.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }

    fn into_entry(self) -> CartEntry {
        CartEntry {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity: Quantity::ONE,
        }
    }
}

/// What a successful cart operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// A new entry was appended at `position` with quantity one.
    Added { position: usize },
    /// The entry at `position` now has `quantity` units.
    Incremented { position: usize, quantity: Quantity },
    /// The entry at `position` now has `quantity` units.
    Decremented { position: usize, quantity: Quantity },
    /// The entry formerly at `position` dropped to zero and was removed.
    Removed { position: usize },
}

impl Change {
    /// Position in the sequence the change applied to.
    #[must_use]
    pub const fn position(&self) -> usize {
        match *self {
            Self::Added { position }
            | Self::Incremented { position, .. }
            | Self::Decremented { position, .. }
            | Self::Removed { position } => position,
        }
    }
}

/// Immutable, ordered cart contents, unique by product id.
///
/// Cloning is cheap (`Arc`), so readers can hold on to a snapshot while the
/// store moves on to the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<[CartEntry]>);

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Snapshot {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Build a snapshot from entries, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateId`] for the first repeated id.
    pub fn from_entries(entries: Vec<CartEntry>) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(&entry.id) {
                return Err(SnapshotError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self(Arc::from(entries)))
    }

    /// Entries in cart order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.0
    }

    /// Iterate over entries in cart order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartEntry> {
        self.0.iter()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find the entry for `id` and its position.
    #[must_use]
    pub fn lookup(&self, id: &ProductId) -> Option<(usize, &CartEntry)> {
        self.0.iter().enumerate().find(|(_, entry)| &entry.id == id)
    }

    /// Add one unit of `item`.
    ///
    /// A new id is appended with quantity one. An id already in the cart is
    /// incremented and the rest of `item` (title, image, price) is ignored.
    #[must_use]
    pub fn add(&self, item: CartItem) -> Option<(Self, Change)> {
        if self.lookup(&item.id).is_some() {
            return self.increment(&item.id);
        }

        let position = self.0.len();
        let entries: Vec<CartEntry> = self
            .0
            .iter()
            .cloned()
            .chain(std::iter::once(item.into_entry()))
            .collect();
        Some((Self(Arc::from(entries)), Change::Added { position }))
    }

    /// Add one unit to the entry for `id`, keeping its position.
    ///
    /// Returns `None` if `id` is not in the cart.
    #[must_use]
    pub fn increment(&self, id: &ProductId) -> Option<(Self, Change)> {
        let (position, entry) = self.lookup(id)?;
        let quantity = entry.quantity.incremented();
        let updated = entry.with_quantity(quantity);
        Some((
            self.replaced(position, updated),
            Change::Incremented { position, quantity },
        ))
    }

    /// Remove one unit from the entry for `id`.
    ///
    /// The entry keeps its position, or is removed when its last unit goes.
    /// Returns `None` if `id` is not in the cart.
    #[must_use]
    pub fn decrement(&self, id: &ProductId) -> Option<(Self, Change)> {
        let (position, entry) = self.lookup(id)?;
        match entry.quantity.decremented() {
            Some(quantity) => {
                let updated = entry.with_quantity(quantity);
                Some((
                    self.replaced(position, updated),
                    Change::Decremented { position, quantity },
                ))
            }
            None => {
                let entries: Vec<CartEntry> = self
                    .0
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != position)
                    .map(|(_, e)| e.clone())
                    .collect();
                Some((Self(Arc::from(entries)), Change::Removed { position }))
            }
        }
    }

    /// Total number of units across all entries (the cart badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.0.iter().map(|e| u64::from(e.quantity.get())).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.0.iter().map(CartEntry::line_total).sum()
    }

    fn replaced(&self, position: usize, updated: CartEntry) -> Self {
        let entries: Vec<CartEntry> = self
            .0
            .iter()
            .enumerate()
            .map(|(i, e)| if i == position { updated.clone() } else { e.clone() })
            .collect();
        Self(Arc::from(entries))
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a CartEntry;
    type IntoIter = std::slice::Iter<'a, CartEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<CartEntry>::deserialize(deserializer)?;
        Self::from_entries(entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn item(id: &str, cents: i64) -> CartItem {
        CartItem::new(
            id,
            format!("Product {id}"),
            format!("https://img/{id}.png"),
            Price::from_cents(cents),
        )
    }

    fn quantities(snapshot: &Snapshot) -> Vec<(&str, u32)> {
        snapshot
            .iter()
            .map(|e| (e.id.as_str(), e.quantity.get()))
            .collect()
    }

    #[test]
    fn test_add_new_item_appends_with_quantity_one() {
        let (cart, change) = Snapshot::empty().add(item("A", 1000)).unwrap();
        assert_eq!(change, Change::Added { position: 0 });
        assert_eq!(quantities(&cart), vec![("A", 1)]);

        let (cart, change) = cart.add(item("B", 500)).unwrap();
        assert_eq!(change, Change::Added { position: 1 });
        assert_eq!(quantities(&cart), vec![("A", 1), ("B", 1)]);
    }

    #[test]
    fn test_re_add_increments_and_ignores_new_metadata() {
        let (cart, _) = Snapshot::empty().add(item("A", 1000)).unwrap();
        let mut changed = item("A", 9999);
        changed.title = "Renamed".to_string();

        let (cart, change) = cart.add(changed).unwrap();
        assert_eq!(
            change,
            Change::Incremented {
                position: 0,
                quantity: Quantity::new(2).unwrap()
            }
        );
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.entries()[0].title, "Product A");
        assert_eq!(cart.entries()[0].price, Price::from_cents(1000));
    }

    #[test]
    fn test_increment_keeps_position() {
        let (cart, _) = Snapshot::empty().add(item("A", 100)).unwrap();
        let (cart, _) = cart.add(item("B", 100)).unwrap();
        let (cart, _) = cart.add(item("C", 100)).unwrap();

        let (cart, change) = cart.increment(&ProductId::new("B")).unwrap();
        assert_eq!(change.position(), 1);
        assert_eq!(quantities(&cart), vec![("A", 1), ("B", 2), ("C", 1)]);
    }

    #[test]
    fn test_decrement_to_zero_removes() {
        let (cart, _) = Snapshot::empty().add(item("A", 100)).unwrap();
        let (cart, _) = cart.add(item("B", 100)).unwrap();
        let (cart, _) = cart.add(item("A", 100)).unwrap();

        let (cart, change) = cart.decrement(&ProductId::new("A")).unwrap();
        assert!(matches!(change, Change::Decremented { position: 0, .. }));
        assert_eq!(quantities(&cart), vec![("A", 1), ("B", 1)]);

        let (cart, change) = cart.decrement(&ProductId::new("A")).unwrap();
        assert_eq!(change, Change::Removed { position: 0 });
        assert_eq!(quantities(&cart), vec![("B", 1)]);
    }

    #[test]
    fn test_missing_id_is_noop() {
        let cart = Snapshot::empty();
        assert!(cart.increment(&ProductId::new("Z")).is_none());
        assert!(cart.decrement(&ProductId::new("Z")).is_none());
    }

    #[test]
    fn test_previous_snapshot_is_untouched() {
        let (before, _) = Snapshot::empty().add(item("A", 100)).unwrap();
        let (after, _) = before.increment(&ProductId::new("A")).unwrap();
        assert_eq!(quantities(&before), vec![("A", 1)]);
        assert_eq!(quantities(&after), vec![("A", 2)]);
    }

    #[test]
    fn test_lookup() {
        let (cart, _) = Snapshot::empty().add(item("A", 100)).unwrap();
        let (cart, _) = cart.add(item("B", 100)).unwrap();
        let (position, entry) = cart.lookup(&ProductId::new("B")).unwrap();
        assert_eq!(position, 1);
        assert_eq!(entry.id.as_str(), "B");
        assert!(cart.lookup(&ProductId::new("C")).is_none());
    }

    #[test]
    fn test_derived_totals() {
        let (cart, _) = Snapshot::empty().add(item("A", 1000)).unwrap();
        let (cart, _) = cart.add(item("A", 1000)).unwrap();
        let (cart, _) = cart.add(item("B", 250)).unwrap();

        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.subtotal(), Price::from_cents(2250));
        assert_eq!(cart.entries()[0].line_total(), Price::from_cents(2000));
    }

    #[test]
    fn test_wire_format_field_names() {
        let (cart, _) = Snapshot::empty()
            .add(CartItem::new("A", "Shirt", "u", Price::from_cents(1000)))
            .unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        let entry = &json.as_array().unwrap()[0];

        assert_eq!(entry["id"], "A");
        assert_eq!(entry["title"], "Shirt");
        assert_eq!(entry["image_url"], "u");
        assert_eq!(entry["quantity"], 1);
        assert!(entry["price"].is_number());
        assert!(entry.get("imageUrl").is_none());
    }

    #[test]
    fn test_deserialize_prior_version_blob() {
        let blob = r#"[
            {"id":"A","title":"Shirt","image_url":"u","price":10,"quantity":2},
            {"id":"B","title":"Hat","image_url":"v","price":7.5,"quantity":1}
        ]"#;
        let cart: Snapshot = serde_json::from_str(blob).unwrap();
        assert_eq!(quantities(&cart), vec![("A", 2), ("B", 1)]);
        assert_eq!(cart.entries()[1].price, Price::from_cents(750));
    }

    #[test]
    fn test_deserialize_rejects_duplicates_and_zero_quantity() {
        let duplicate = r#"[
            {"id":"A","title":"Shirt","image_url":"u","price":10,"quantity":1},
            {"id":"A","title":"Shirt","image_url":"u","price":10,"quantity":1}
        ]"#;
        let err = serde_json::from_str::<Snapshot>(duplicate).unwrap_err();
        assert!(err.to_string().contains("duplicate cart entry"));

        let zero = r#"[{"id":"A","title":"Shirt","image_url":"u","price":10,"quantity":0}]"#;
        assert!(serde_json::from_str::<Snapshot>(zero).is_err());
    }
}
