//! Read-through accessors.
//!
//! Every read goes to the network first. A successful collection fetch
//! refreshes the cache slot; a failed one is answered from the slot (or
//! with an empty list), so callers never see read errors.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use memoires_http::{ApiClient, Error as HttpError};

use crate::cache::{CatalogCache, CollectionCache};
use crate::config::CatalogConfig;
use crate::models::{Encadreur, Filiere, KeyWord, Memoire, RecordKey};
use crate::paths;

/// A resource fetched as a whole collection.
pub trait Collection: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path, relative to the API base.
    const PATH: &'static str;

    fn slot(cache: &CatalogCache) -> &CollectionCache<Self>;
}

/// A resource that can also be fetched on its own.
pub trait Keyed: Collection {
    fn id(&self) -> u64;

    fn item_path(id: u64) -> String;
}

impl Collection for Memoire {
    const PATH: &'static str = paths::MEMORIES;

    fn slot(cache: &CatalogCache) -> &CollectionCache<Self> {
        &cache.memoires
    }
}

impl Keyed for Memoire {
    fn id(&self) -> u64 {
        self.id
    }

    fn item_path(id: u64) -> String {
        paths::memoire(id)
    }
}

impl Collection for Filiere {
    const PATH: &'static str = paths::TRACKS;

    fn slot(cache: &CatalogCache) -> &CollectionCache<Self> {
        &cache.filieres
    }
}

impl Keyed for Filiere {
    fn id(&self) -> u64 {
        self.id
    }

    fn item_path(id: u64) -> String {
        paths::track(id)
    }
}

impl Collection for Encadreur {
    const PATH: &'static str = paths::SUPERVISORS;

    fn slot(cache: &CatalogCache) -> &CollectionCache<Self> {
        &cache.encadreurs
    }
}

impl Keyed for Encadreur {
    fn id(&self) -> u64 {
        self.id
    }

    fn item_path(id: u64) -> String {
        paths::supervisor(id)
    }
}

impl Collection for KeyWord {
    const PATH: &'static str = paths::KEYWORDS;

    fn slot(cache: &CatalogCache) -> &CollectionCache<Self> {
        &cache.keywords
    }
}

fn decode_records<R: DeserializeOwned>(path: &str, raw: Vec<Value>) -> Vec<R> {
    raw.into_iter()
        .filter_map(|record| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(error) => {
                warn!(path, %error, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// Entry point for UI collaborators.
///
/// Cheap to clone; clones share the client and the cache.
#[derive(Clone)]
pub struct Catalog {
    pub(crate) client: ApiClient,
    pub(crate) cache: Arc<CatalogCache>,
    pub(crate) config: CatalogConfig,
}

impl Catalog {
    /// A catalogue with its own empty cache and default settings.
    pub fn new(client: ApiClient) -> Self {
        let config = CatalogConfig::for_client(client.config());
        Self::with_cache(client, Arc::new(CatalogCache::new()), config)
    }

    pub fn with_cache(client: ApiClient, cache: Arc<CatalogCache>, config: CatalogConfig) -> Self {
        Self {
            client,
            cache,
            config,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Full collection of `R`: fresh when the backend answers, cached otherwise.
    ///
    /// Records are decoded one by one; a record that cannot be read at all
    /// is dropped with a warning and the rest of the collection is kept.
    pub async fn get_all<R: Collection>(&self) -> Vec<R> {
        R::slot(&self.cache)
            .fetch_or_cached(|| async {
                let raw = self.client.get_json::<Vec<Value>>(R::PATH).await?;
                Ok::<_, HttpError>(decode_records(R::PATH, raw))
            })
            .await
    }

    /// One `R` by id.
    ///
    /// A populated cache is scanned first and a hit is returned without a
    /// network call, even if the backend copy has changed since. A miss is
    /// fetched individually; any failure yields `None`.
    pub async fn get_by_id<R: Keyed>(&self, id: u64) -> Option<R> {
        if let Some(hit) = R::slot(&self.cache).find(|item| item.id() == id) {
            return Some(hit);
        }

        match self.client.get_json::<R>(&R::item_path(id)).await {
            Ok(item) => Some(item),
            Err(error) => {
                warn!(path = %R::item_path(id), %error, "lookup by id failed");
                None
            }
        }
    }

    pub async fn get_all_memoires(&self) -> Vec<Memoire> {
        self.get_all().await
    }

    pub async fn get_memoire_by_id(&self, id: u64) -> Option<Memoire> {
        self.get_by_id(id).await
    }

    /// Newest records first, by year then creation date.
    pub async fn get_recent_memoires(&self, limit: usize) -> Vec<Memoire> {
        let mut memoires = self.get_all_memoires().await;
        memoires.sort_by(Memoire::newest_first);
        memoires.truncate(limit);
        memoires
    }

    /// Records whose `filiere_id`, `filiere` or `track_id` equals `key`.
    pub async fn get_memoires_by_filiere(&self, key: &RecordKey) -> Vec<Memoire> {
        let mut memoires = self.get_all_memoires().await;
        memoires.retain(|m| m.belongs_to_filiere(key));
        memoires
    }

    pub async fn get_memoires_by_year(&self, annee: i32) -> Vec<Memoire> {
        let mut memoires = self.get_all_memoires().await;
        memoires.retain(|m| m.annee == Some(annee));
        memoires
    }

    /// Records whose `encadreur_id` or `encadreur` equals `key`.
    pub async fn get_memoires_by_encadreur(&self, key: &RecordKey) -> Vec<Memoire> {
        let mut memoires = self.get_all_memoires().await;
        memoires.retain(|m| m.supervised_by(key));
        memoires
    }

    /// Case-insensitive substring search over `fields`.
    ///
    /// A blank query returns nothing and makes no call.
    pub async fn search_memoires(&self, query: &str, fields: &[&str]) -> Vec<Memoire> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut memoires = self.get_all_memoires().await;
        memoires.retain(|m| {
            fields.iter().any(|field| {
                m.field_text(field)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        });
        memoires
    }

    pub async fn get_all_filieres(&self) -> Vec<Filiere> {
        self.get_all().await
    }

    pub async fn get_filiere_by_id(&self, id: u64) -> Option<Filiere> {
        self.get_by_id(id).await
    }

    pub async fn get_all_encadreurs(&self) -> Vec<Encadreur> {
        self.get_all().await
    }

    pub async fn get_encadreur_by_id(&self, id: u64) -> Option<Encadreur> {
        self.get_by_id(id).await
    }

    pub async fn get_all_keywords(&self) -> Vec<KeyWord> {
        self.get_all().await
    }

    /// Drop every cached collection. Nothing is fetched until the next read.
    pub fn refresh_all_data(&self) {
        self.cache.invalidate_all();
        info!("catalogue cache cleared; next reads go to the backend");
    }
}
