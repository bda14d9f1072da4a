//! The durable response cache.
//!
//! Keyed by exact rendered message text (no normalization, no trimming),
//! so two messages differing by whitespace are distinct entries. Entries
//! never expire and are never evicted; the collection grows for the
//! lifetime of the store. Combined with lookup-before-inference this gives
//! at-most-one-inference-per-distinct-message semantics across a run and
//! across process restarts.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::store::KvStore;

/// The collection name cached responses are saved under.
pub const RESPONSES_COLLECTION: &str = "responses";

/// A write-through cache of model responses over a [`KvStore`].
///
/// Entries are loaded lazily on first use and the full collection is
/// rewritten on every insertion. A disabled cache reports every lookup
/// as absent and drops every store.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use promptgen::{MemoryStore, ResponseCache};
///
/// let mut cache = ResponseCache::new(Arc::new(MemoryStore::new()));
/// assert_eq!(cache.lookup("message").unwrap(), None);
///
/// cache.store("message", "answer").unwrap();
/// assert_eq!(cache.lookup("message").unwrap(), Some("answer".to_string()));
///
/// // Exact key equality: whitespace matters.
/// assert_eq!(cache.lookup("message ").unwrap(), None);
/// ```
pub struct ResponseCache {
    store: Option<Arc<dyn KvStore>>,
    collection: String,
    entries: Option<HashMap<String, String>>,
}

impl ResponseCache {
    /// A cache persisting through `store` under the default collection.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_collection(store, RESPONSES_COLLECTION)
    }

    /// A cache persisting under a custom collection name.
    pub fn with_collection(store: Arc<dyn KvStore>, collection: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            collection: collection.into(),
            entries: None,
        }
    }

    /// A cache that never hits and never persists.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            store: None,
            collection: RESPONSES_COLLECTION.to_string(),
            entries: None,
        }
    }

    /// Whether this cache persists anything.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    fn entries_mut(&mut self) -> Result<&mut HashMap<String, String>> {
        if self.entries.is_none() {
            let loaded = match &self.store {
                Some(store) => {
                    let entries = store.load(&self.collection)?;
                    debug!(
                        collection = %self.collection,
                        entries = entries.len(),
                        "loaded response cache"
                    );
                    entries
                }
                None => HashMap::new(),
            };
            self.entries = Some(loaded);
        }
        Ok(self.entries.as_mut().expect("entries just populated"))
    }

    /// Look up the cached response for an exact message text.
    pub fn lookup(&mut self, message: &str) -> Result<Option<String>> {
        if self.store.is_none() {
            return Ok(None);
        }
        Ok(self.entries_mut()?.get(message).cloned())
    }

    /// Record a response, rewriting the backing collection synchronously.
    pub fn store(&mut self, message: &str, response: &str) -> Result<()> {
        let Some(store) = self.store.clone() else {
            return Ok(());
        };
        let collection = self.collection.clone();
        let entries = self.entries_mut()?;
        entries.insert(message.to_string(), response.to_string());
        store.save(&collection, entries)
    }
}
