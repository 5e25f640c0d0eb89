//! Record stores for artist bookings
//!
//! `ArtistStore` is the contract every backend fulfils: a single ordered
//! collection keyed by an opaque string id. The SQLite backend lives in
//! `crate::db`; the in-memory one here.

mod artist_store;

pub use artist_store::MemoryArtistStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Artist, ArtistUpdate, NewArtist};

/// Errors raised by a record store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Store is closed")]
    Closed,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Collection of artist records
#[async_trait]
pub trait ArtistStore: Send + Sync {
    /// All records in the store's natural (insertion) order
    async fn find_all(&self) -> StoreResult<Vec<Artist>>;

    /// Insert a record and return it with its new id
    async fn insert_one(&self, new: NewArtist) -> StoreResult<Artist>;

    /// Set one field on one record; returns whether a record matched
    async fn update_one_by_id(&self, id: &str, update: &ArtistUpdate) -> StoreResult<bool>;

    async fn find_one_by_id(&self, id: &str) -> StoreResult<Option<Artist>>;

    /// Release backend resources; later calls fail with `StoreError::Closed`
    async fn close(&self);
}

/// Fresh opaque identifier for a new record
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
