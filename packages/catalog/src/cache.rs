//! Last-good copies of each resource collection.
//!
//! A [`CatalogCache`] is built once per session and handed to the
//! [`crate::Catalog`]. Each slot is either empty (never fetched, or
//! invalidated) or holds the full collection from the last successful
//! fetch, in server order. Only a successful fetch writes a slot; only
//! [`CatalogCache::invalidate_all`] or [`CollectionCache::invalidate`]
//! clears it.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use tracing::warn;

use crate::models::{Encadreur, Filiere, KeyWord, Memoire};

/// One cache slot.
#[derive(Debug)]
pub struct CollectionCache<T> {
    name: &'static str,
    slot: RwLock<Option<Vec<T>>>,
}

impl<T: Clone> CollectionCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A copy of the cached collection, if any.
    pub fn get(&self) -> Option<Vec<T>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_populated(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the slot with a freshly fetched collection.
    pub fn store(&self, items: Vec<T>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(items);
    }

    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Scan the cached collection without copying it.
    pub fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()?
            .iter()
            .find(|item| predicate(item))
            .cloned()
    }

    /// Run `fetch`; keep and return its result on success.
    ///
    /// On failure the cached copy is returned unchanged, or an empty
    /// collection when nothing was ever cached. A stale view is preferred
    /// over a blank one.
    pub async fn fetch_or_cached<F, Fut, E>(&self, fetch: F) -> Vec<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: std::fmt::Display,
    {
        match fetch().await {
            Ok(items) => {
                self.store(items.clone());
                items
            }
            Err(error) => {
                let cached = self.get();
                warn!(
                    collection = self.name,
                    %error,
                    cached = cached.is_some(),
                    "fetch failed, serving cached collection"
                );
                cached.unwrap_or_default()
            }
        }
    }
}

/// All collection slots for one session.
#[derive(Debug)]
pub struct CatalogCache {
    pub memoires: CollectionCache<Memoire>,
    pub filieres: CollectionCache<Filiere>,
    pub encadreurs: CollectionCache<Encadreur>,
    pub keywords: CollectionCache<KeyWord>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self {
            memoires: CollectionCache::new("memoires"),
            filieres: CollectionCache::new("filieres"),
            encadreurs: CollectionCache::new("encadreurs"),
            keywords: CollectionCache::new("keywords"),
        }
    }
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every slot. The next fetch of each collection goes to the network.
    pub fn invalidate_all(&self) {
        self.memoires.invalidate();
        self.filieres.invalidate();
        self.encadreurs.invalidate();
        self.keywords.invalidate();
    }
}
