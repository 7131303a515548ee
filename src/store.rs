//! State stores
//!
//! The cart and session never touch ambient storage; they are handed a
//! [`StateStore`] and go through its load/save contract on every mutation.

use std::{collections::BTreeMap, fs, io, path::PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::ProductId;

/// Key holding the persisted cart snapshot.
pub const CART_KEY: &str = "cart";

/// Key holding the logged-in flag (`"true"` when a session is active).
pub const LOGGED_IN_KEY: &str = "isLoggedIn";

/// Key holding the session role (`"user"` or `"admin"`).
pub const USER_ROLE_KEY: &str = "userRole";

/// Errors from reading or writing a state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error on the backing file.
    #[error("failed to access the backing file: {0}")]
    Io(#[from] io::Error),

    /// A stored value did not parse.
    #[error("failed to parse a stored value: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// An injected key-value store for persisted UI state.
///
/// Single writer, synchronous, last write wins; concurrent stores sharing a
/// backing file are not reconciled.
pub trait StateStore {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the value cannot be persisted.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the removal cannot be persisted.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// The canonical persisted projection of one cart line: `{id, quantity}`.
///
/// The legacy wide shape `{id, productId, name, quantity, price}` is accepted
/// when reading (its `productId` becomes [`SnapshotEntry::id`]) but is never
/// written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireSnapshotEntry")]
pub struct SnapshotEntry {
    /// Catalog identifier the entry resolves against on load.
    pub id: ProductId,

    /// Persisted quantity.
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireSnapshotEntry {
    Legacy {
        #[serde(rename = "productId")]
        product_id: ProductId,
        quantity: u32,
    },
    Canonical {
        id: ProductId,
        quantity: u32,
    },
}

impl From<WireSnapshotEntry> for SnapshotEntry {
    fn from(wire: WireSnapshotEntry) -> Self {
        match wire {
            WireSnapshotEntry::Legacy {
                product_id,
                quantity,
            } => Self {
                id: product_id,
                quantity,
            },
            WireSnapshotEntry::Canonical { id, quantity } => Self { id, quantity },
        }
    }
}

/// Read the cart snapshot; an absent key is an empty cart.
///
/// # Errors
///
/// Returns a [`StoreError`] if the stored snapshot does not parse.
pub fn load_snapshot<S: StateStore + ?Sized>(store: &S) -> Result<Vec<SnapshotEntry>, StoreError> {
    match store.get(CART_KEY) {
        Some(raw) => Ok(serde_norway::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Write the cart snapshot in the canonical shape.
///
/// # Errors
///
/// Returns a [`StoreError`] if serialization or the write fails.
pub fn save_snapshot<S: StateStore + ?Sized>(
    store: &mut S,
    entries: &[SnapshotEntry],
) -> Result<(), StoreError> {
    let raw = serde_norway::to_string(entries)?;

    store.set(CART_KEY, &raw)
}

/// Delete the cart snapshot.
///
/// # Errors
///
/// Returns a [`StoreError`] if the removal cannot be persisted.
pub fn clear_snapshot<S: StateStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    store.remove(CART_KEY)
}

/// An in-memory store, the default for tests and single-session demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: FxHashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// A store backed by one YAML file, flushed on every write.
///
/// Plays the role the browser's local storage played in the original: state
/// survives a reload, and the last writer wins.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open a store, reading the current contents if the file exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_norway::from_str(&contents)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self { path, values })
    }

    /// The backing file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let contents = serde_norway::to_string(&self.values)?;

        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn load_snapshot_without_key_is_empty() -> TestResult {
        let store = MemoryStore::new();

        assert_eq!(load_snapshot(&store)?, Vec::new());

        Ok(())
    }

    #[test]
    fn snapshot_round_trips_through_memory_store() -> TestResult {
        let mut store = MemoryStore::new();
        let entries = vec![
            SnapshotEntry {
                id: ProductId::from("p1"),
                quantity: 2,
            },
            SnapshotEntry {
                id: ProductId::from("p3"),
                quantity: 1,
            },
        ];

        save_snapshot(&mut store, &entries)?;

        assert_eq!(load_snapshot(&store)?, entries);

        Ok(())
    }

    #[test]
    fn clear_snapshot_removes_the_key() -> TestResult {
        let mut store = MemoryStore::new();

        save_snapshot(
            &mut store,
            &[SnapshotEntry {
                id: ProductId::from("p1"),
                quantity: 1,
            }],
        )?;
        clear_snapshot(&mut store)?;

        assert_eq!(store.get(CART_KEY), None);
        assert_eq!(load_snapshot(&store)?, Vec::new());

        Ok(())
    }

    #[test]
    fn legacy_wide_entries_parse_with_product_id_winning() -> TestResult {
        let raw = "\
- id: ci1
  productId: p1
  name: Fresh Apples
  quantity: 2
  price: 2.99
- id: p3
  quantity: 1
";

        let entries: Vec<SnapshotEntry> = serde_norway::from_str(raw)?;

        assert_eq!(
            entries,
            vec![
                SnapshotEntry {
                    id: ProductId::from("p1"),
                    quantity: 2,
                },
                SnapshotEntry {
                    id: ProductId::from("p3"),
                    quantity: 1,
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn snapshot_serializes_in_the_canonical_shape() -> TestResult {
        let raw = serde_norway::to_string(&[SnapshotEntry {
            id: ProductId::from("p1"),
            quantity: 2,
        }])?;

        assert!(raw.contains("id: p1"), "canonical id field missing: {raw}");
        assert!(!raw.contains("productId"), "legacy field leaked: {raw}");

        Ok(())
    }

    #[test]
    fn file_store_persists_across_reopen() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state.yml");

        {
            let mut store = FileStore::open(&path)?;
            store.set(LOGGED_IN_KEY, "true")?;
            store.set(USER_ROLE_KEY, "admin")?;
        }

        let store = FileStore::open(&path)?;

        assert_eq!(store.get(LOGGED_IN_KEY).as_deref(), Some("true"));
        assert_eq!(store.get(USER_ROLE_KEY).as_deref(), Some("admin"));

        Ok(())
    }

    #[test]
    fn file_store_remove_is_a_noop_for_absent_keys() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path().join("state.yml"))?;

        store.remove("missing")?;

        assert_eq!(store.get("missing"), None);

        Ok(())
    }

    #[test]
    fn file_store_last_write_wins() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state.yml");

        let mut first = FileStore::open(&path)?;
        let mut second = FileStore::open(&path)?;

        first.set(USER_ROLE_KEY, "user")?;
        second.set(USER_ROLE_KEY, "admin")?;

        let reopened = FileStore::open(&path)?;

        assert_eq!(reopened.get(USER_ROLE_KEY).as_deref(), Some("admin"));

        Ok(())
    }
}
