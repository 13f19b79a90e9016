use std::fmt;
use std::sync::Arc;

use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Result, StorageMedium};

/// Storage key for the signed-in user.
pub const SESSION_KEY: &str = "ulimi_user";

/// The persisted entity collections, one storage key each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Farms,
    Crops,
    Products,
    Orders,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Farms,
        Collection::Crops,
        Collection::Products,
        Collection::Orders,
        Collection::Users,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Collection::Farms => "ulimi_farms",
            Collection::Crops => "ulimi_crops",
            Collection::Products => "ulimi_products",
            Collection::Orders => "ulimi_orders",
            Collection::Users => "ulimi_users",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Collection::Farms => "farms",
            Collection::Crops => "crops",
            Collection::Products => "products",
            Collection::Orders => "orders",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed JSON access to a [`StorageMedium`].
///
/// Values that no longer parse (hand-edited files, an older format) are logged and
/// treated as absent, so callers fall back to their defaults instead of failing to start.
#[derive(Clone)]
pub struct Repository {
    medium: Arc<dyn StorageMedium>,
}

impl Repository {
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self { medium }
    }

    /// Writes the whole collection under its key.
    pub fn save<T: Serialize>(&self, collection: Collection, items: &[T]) -> Result<()> {
        self.save_entry(collection.key(), items)
    }

    /// Reads a collection. `Ok(None)` when nothing is stored or the stored value is malformed.
    pub fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Option<Vec<T>>> {
        self.load_entry(collection.key())
    }

    pub fn save_entry<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.medium.set(key, &json)
    }

    pub fn load_entry<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.medium.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Could not unmarshal stored value for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub fn remove_entry(&self, key: &str) -> Result<()> {
        self.medium.remove(key)
    }

    /// Removes every collection key, all or nothing. The session key is left alone.
    pub fn clear_collections(&self) -> Result<()> {
        let writes: Vec<(&str, Option<String>)> =
            Collection::ALL.iter().map(|c| (c.key(), None)).collect();
        self.commit(&writes)
    }

    /// Applies every write or none of them. A `None` value removes the key.
    ///
    /// The current value of each key is read first. If a write fails, the keys already
    /// written get their old values back before the error is returned.
    pub fn commit(&self, writes: &[(&str, Option<String>)]) -> Result<()> {
        let previous = writes
            .iter()
            .map(|(key, _)| self.medium.get(key))
            .collect::<Result<Vec<_>>>()?;

        for (done, (key, value)) in writes.iter().enumerate() {
            if let Err(e) = self.apply(key, value.as_deref()) {
                warn!("Write to {} failed, rolling back {} earlier writes", key, done);
                self.roll_back(&writes[..done], &previous[..done]);
                return Err(e);
            }
        }
        Ok(())
    }

    fn apply(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.medium.set(key, value),
            None => self.medium.remove(key),
        }
    }

    fn roll_back(&self, writes: &[(&str, Option<String>)], previous: &[Option<String>]) {
        for ((key, _), old) in writes.iter().zip(previous).rev() {
            if let Err(e) = self.apply(key, old.as_deref()) {
                error!("Could not restore {} after a failed write: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryMedium;
    use crate::Error;
    use serde::Deserialize;

    /// Memory medium that refuses to touch one key.
    struct FailingMedium {
        inner: MemoryMedium,
        broken: &'static str,
    }

    impl StorageMedium for FailingMedium {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if key == self.broken {
                return Err(Error::Internal(format!("disk full writing {}", key)));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            if key == self.broken {
                return Err(Error::Internal(format!("cannot remove {}", key)));
            }
            self.inner.remove(key)
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        n: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: "b".into(), n: 2 },
            Row { id: "a".into(), n: 1 },
            Row { id: "c".into(), n: 3 },
        ]
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let repo = Repository::new(Arc::new(MemoryMedium::new()));
        repo.save(Collection::Farms, &rows()).unwrap();

        let loaded: Vec<Row> = repo.load(Collection::Farms).unwrap().unwrap();
        assert_eq!(loaded, rows());
    }

    #[test]
    fn test_missing_collection_is_none() {
        let repo = Repository::new(Arc::new(MemoryMedium::new()));
        let loaded: Option<Vec<Row>> = repo.load(Collection::Orders).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_collection_is_none() {
        let medium = Arc::new(MemoryMedium::with_entries([("ulimi_crops", "{not json")]));
        let repo = Repository::new(medium);
        let loaded: Option<Vec<Row>> = repo.load(Collection::Crops).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_clear_collections_keeps_session() {
        let medium = Arc::new(MemoryMedium::new());
        let repo = Repository::new(medium.clone());
        for c in Collection::ALL {
            repo.save::<Row>(c, &[]).unwrap();
        }
        repo.save_entry(SESSION_KEY, &Row { id: "u".into(), n: 0 }).unwrap();

        repo.clear_collections().unwrap();
        assert_eq!(medium.keys(), vec![SESSION_KEY.to_string()]);
    }

    #[test]
    fn test_commit_rolls_back_on_failure() {
        let medium = Arc::new(FailingMedium {
            inner: MemoryMedium::with_entries([("ulimi_farms", "[1]")]),
            broken: "ulimi_products",
        });
        let repo = Repository::new(medium.clone());

        let writes = vec![
            ("ulimi_farms", Some("[2]".to_string())),
            ("ulimi_crops", Some("[3]".to_string())),
            ("ulimi_products", Some("[4]".to_string())),
        ];
        assert!(repo.commit(&writes).is_err());

        assert_eq!(medium.inner.get("ulimi_farms").unwrap().as_deref(), Some("[1]"));
        assert_eq!(medium.inner.get("ulimi_crops").unwrap(), None);
    }

    #[test]
    fn test_failed_clear_keeps_every_collection() {
        let medium = Arc::new(FailingMedium {
            inner: MemoryMedium::new(),
            broken: "ulimi_orders",
        });
        let repo = Repository::new(medium.clone());
        for c in [Collection::Farms, Collection::Crops, Collection::Products] {
            repo.save(c, &rows()).unwrap();
        }

        assert!(repo.clear_collections().is_err());
        let farms: Vec<Row> = repo.load(Collection::Farms).unwrap().unwrap();
        assert_eq!(farms, rows());
        assert_eq!(medium.inner.keys().len(), 3);
    }
}
