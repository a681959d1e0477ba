use url::Url;

use memoires_http::ClientConfig;

use crate::throttle::Throttle;

/// Fields scanned by a search when the caller names none.
pub const DEFAULT_SEARCH_FIELDS: [&str; 4] = ["titre", "auteur", "mots_cles", "description"];

pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Settings for a [`crate::Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Where relative `fichier_pdf` paths are resolved.
    pub media_root: Url,
    /// Pacing of batch deletions.
    pub batch: Throttle,
    /// Length of the "recent" list when the caller gives none.
    pub recent_limit: usize,
}

impl CatalogConfig {
    /// Defaults for a backend reached through `client`.
    pub fn for_client(client: &ClientConfig) -> Self {
        Self {
            media_root: client.origin(),
            batch: Throttle::default(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn with_media_root(mut self, media_root: Url) -> Self {
        self.media_root = media_root;
        self
    }

    pub fn with_batch(mut self, batch: Throttle) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }
}
