use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::graph::ProductKey;
use crate::modules::Product;

struct Entry {
    product: Arc<Product>,
    pending: AtomicUsize,
}

/// Consumer-counted store of materialized products.
///
/// A product stays live while at least one declared consumer has not run.
/// Products with no consumers are never live: they are dropped on insert, or
/// moved to the retained set when terminal retention is on.
pub struct ProductStore {
    entries: RwLock<HashMap<ProductKey, Entry>>,
    retained: RwLock<HashMap<ProductKey, Arc<Product>>>,
    retain_terminal: bool,
    peak_live: AtomicUsize,
}

impl ProductStore {
    pub fn new(retain_terminal: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            retained: RwLock::new(HashMap::new()),
            retain_terminal,
            peak_live: AtomicUsize::new(0),
        }
    }

    /// Publish a product awaited by `consumers` modules.
    pub fn insert(&self, key: ProductKey, product: Product, consumers: usize) {
        if consumers == 0 {
            if self.retain_terminal {
                self.retained.write().insert(key, Arc::new(product));
            } else {
                tracing::debug!(product = %key, "product has no consumers, released");
            }
            return;
        }

        let mut entries = self.entries.write();
        entries.insert(
            key,
            Entry {
                product: Arc::new(product),
                pending: AtomicUsize::new(consumers),
            },
        );
        self.peak_live.fetch_max(entries.len(), Ordering::Relaxed);
    }

    pub fn get(&self, key: &ProductKey) -> Option<Arc<Product>> {
        self.entries
            .read()
            .get(key)
            .map(|entry| Arc::clone(&entry.product))
    }

    pub fn contains(&self, key: &ProductKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// One consumer of `key` finished. Returns `true` when that freed it.
    pub fn release_one(&self, key: &ProductKey) -> bool {
        let last = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) => entry.pending.fetch_sub(1, Ordering::AcqRel) == 1,
                None => false,
            }
        };
        if last {
            self.entries.write().remove(key);
            tracing::debug!(product = %key, "product released");
        }
        last
    }

    /// Consumers still waiting on `key`.
    pub fn pending(&self, key: &ProductKey) -> Option<usize> {
        self.entries
            .read()
            .get(key)
            .map(|entry| entry.pending.load(Ordering::Acquire))
    }

    pub fn live_count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::Relaxed)
    }

    /// Drop every live product. Returns how many were released.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let released = entries.len();
        entries.clear();
        released
    }

    /// Hand over retained terminal products, keyed by product name.
    pub fn take_retained(&self) -> HashMap<String, Arc<Product>> {
        std::mem::take(&mut *self.retained.write())
            .into_iter()
            .map(|(key, product)| (key.output, product))
            .collect()
    }
}
