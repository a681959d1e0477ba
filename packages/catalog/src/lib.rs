//! # memoires-catalog
//!
//! Typed access to the thesis catalogue: theses ("mémoires"), tracks
//! ("filières"), supervisors ("encadreurs") and keywords.
//!
//! Reads never fail. Each collection fetch refreshes a per-session cache
//! slot, and an unreachable backend is answered from that slot (or with an
//! empty list):
//!
//! ```ignore
//! use memoires_catalog::Catalog;
//! use memoires_http::{ApiClient, ClientConfig};
//!
//! let catalog = Catalog::new(ApiClient::new(ClientConfig::default())?);
//!
//! let recent = catalog.get_recent_memoires(5).await;
//! let stats = catalog.get_global_stats().await;
//! println!("{} theses, latest year {}", stats.total_memoires, stats.latest_year);
//! ```
//!
//! Mutations return [`Error`] and do not touch the cache; call
//! [`Catalog::refresh_all_data`] afterwards to drop stale copies.

pub mod accessors;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod mutations;
pub mod paths;
pub mod stats;
pub mod throttle;

pub use accessors::{Catalog, Collection, Keyed};
pub use cache::{CatalogCache, CollectionCache};
pub use config::{CatalogConfig, DEFAULT_RECENT_LIMIT, DEFAULT_SEARCH_FIELDS};
pub use error::{Error, Result};
pub use models::{
    Encadreur, EncadreurView, Filiere, FiliereView, KeyWord, Memoire, MemoireView, RecordKey,
};
pub use mutations::{BatchDeleteReport, DeleteFailure};
pub use stats::{EncadreurStats, FiliereStats, GlobalStats};
pub use throttle::Throttle;
