//! Catalog

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::products::{Product, ProductId, ProductKey};

/// The read-only product store.
///
/// Lookups by identifier return an absence rather than an error; callers
/// treat a miss as a recoverable empty state.
#[derive(Debug, Default)]
pub struct Catalog {
    products: SlotMap<ProductKey, Product>,
    ids: FxHashMap<ProductId, ProductKey>,
}

impl Catalog {
    /// Build a catalog from a fixed list of products.
    ///
    /// A repeated id replaces the earlier record, matching last-write-wins
    /// mock data.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Self::default();

        for product in products {
            let id = product.id.clone();

            if let Some(&key) = catalog.ids.get(&id) {
                if let Some(slot) = catalog.products.get_mut(key) {
                    *slot = product;
                }
            } else {
                let key = catalog.products.insert(product);
                catalog.ids.insert(id, key);
            }
        }

        catalog
    }

    /// Look up a product by identifier.
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.ids.get(id).and_then(|key| self.products.get(*key))
    }

    /// Look up a product's slot key by identifier.
    pub fn key(&self, id: &ProductId) -> Option<ProductKey> {
        self.ids.get(id).copied()
    }

    /// Look up a product by slot key.
    pub fn by_key(&self, key: ProductKey) -> Option<&Product> {
        self.products.get(key)
    }

    /// Iterate over all products in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, name: &str, price: Decimal) -> Product {
        Product {
            id: ProductId::from(id),
            name: name.to_owned(),
            category: "Fruits".to_owned(),
            description: String::new(),
            price,
            stock: 10,
        }
    }

    #[test]
    fn get_returns_product_by_id() {
        let catalog = Catalog::new([product("p1", "Fresh Apples", Decimal::new(299, 2))]);

        let found = catalog.get(&ProductId::from("p1"));

        assert_eq!(found.map(|p| p.name.as_str()), Some("Fresh Apples"));
    }

    #[test]
    fn get_miss_is_an_absence_not_an_error() {
        let catalog = Catalog::new([product("p1", "Fresh Apples", Decimal::new(299, 2))]);

        assert!(catalog.get(&ProductId::from("p999")).is_none());
    }

    #[test]
    fn duplicate_id_replaces_earlier_record() {
        let catalog = Catalog::new([
            product("p1", "Fresh Apples", Decimal::new(299, 2)),
            product("p1", "Greener Apples", Decimal::new(199, 2)),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get(&ProductId::from("p1")).map(|p| p.price),
            Some(Decimal::new(199, 2))
        );
    }

    #[test]
    fn key_and_by_key_round_trip() {
        let catalog = Catalog::new([product("p1", "Fresh Apples", Decimal::new(299, 2))]);

        let key = catalog.key(&ProductId::from("p1"));

        assert_eq!(
            key.and_then(|k| catalog.by_key(k)).map(|p| p.id.as_str()),
            Some("p1")
        );
    }

    #[test]
    fn empty_catalog() {
        let catalog = Catalog::new([]);

        assert!(catalog.is_empty());
        assert_eq!(catalog.iter().count(), 0);
    }
}
