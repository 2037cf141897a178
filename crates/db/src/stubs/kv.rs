use std::collections::HashMap;

use parking_lot::Mutex;

use crate::{traits::KvStore, DbResult};

/// In-memory [`KvStore`].
#[derive(Debug, Default)]
pub struct StubKvStore(Mutex<HashMap<String, String>>);

impl StubKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self(Mutex::new(map))
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.0.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KvStore for StubKvStore {
    fn get(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.0.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> DbResult<()> {
        self.0.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> DbResult<()> {
        self.0.lock().remove(key);
        Ok(())
    }
}
