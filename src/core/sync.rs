//! Artist synchronization service
//!
//! Translates list/create/update requests into record store calls. The store
//! handle is injected at construction; the service never creates one.

use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::{Artist, ArtistUpdate, NewArtist, UpdateError};
use crate::stores::{ArtistStore, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),

    #[error("Artist not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<UpdateError> for SyncError {
    fn from(err: UpdateError) -> Self {
        SyncError::Validation(err.to_string())
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Request-handling layer over an artist store
#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn ArtistStore>,
}

impl SyncService {
    pub fn new(store: Arc<dyn ArtistStore>) -> Self {
        Self { store }
    }

    /// Every record in store order
    pub async fn list(&self) -> SyncResult<Vec<Artist>> {
        Ok(self.store.find_all().await?)
    }

    pub async fn create(&self, new: NewArtist) -> SyncResult<Artist> {
        new.validate()?;
        let artist = self.store.insert_one(new).await?;
        debug!(id = %artist.id, "created artist");
        Ok(artist)
    }

    /// Set one field on one record and return the record as stored
    pub async fn update_one(&self, id: &str, update: &ArtistUpdate) -> SyncResult<Artist> {
        self.store.update_one_by_id(id, update).await?;
        self.store
            .find_one_by_id(id)
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }

    /// Apply one field/value to every id concurrently.
    ///
    /// Each update is independent: all of them run to completion even if
    /// some fail, and nothing is rolled back. The returned count is the
    /// number of ids submitted, not the number that matched a record.
    pub async fn update_many(&self, ids: &[String], update: &ArtistUpdate) -> SyncResult<usize> {
        let results = join_all(
            ids.iter()
                .map(|id| self.store.update_one_by_id(id, update)),
        )
        .await;

        let mut first_error = None;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(true) => {}
                Ok(false) => debug!(id = %id, "bulk update matched no record"),
                Err(e) => {
                    error!(id = %id, field = %update.field(), "bulk update failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(ids.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtistField, YesNo};
    use crate::stores::{MemoryArtistStore, StoreResult};
    use async_trait::async_trait;

    fn service() -> SyncService {
        SyncService::new(Arc::new(MemoryArtistStore::new()))
    }

    fn band_a() -> NewArtist {
        NewArtist {
            name: "Band A".into(),
            response: YesNo::No,
            available: YesNo::No,
            cost: 500.0,
        }
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let service = service();
        let created = service.create(band_a()).await.unwrap();

        let all = service.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], created);
        assert!(!all[0].id.is_empty());
        assert_eq!(all[0].name, "Band A");
        assert_eq!(all[0].cost, 500.0);
        assert_eq!(all[0].saved, None);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_cost() {
        let mut new = band_a();
        new.cost = -5.0;
        assert!(matches!(
            service().create(new).await,
            Err(SyncError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_one_changes_only_that_field() {
        let service = service();
        let created = service.create(band_a()).await.unwrap();

        let updated = service
            .update_one(&created.id, &ArtistUpdate::Cost(750.0))
            .await
            .unwrap();

        assert_eq!(updated.cost, 750.0);
        assert_eq!(
            Artist {
                cost: 500.0,
                ..updated
            },
            created
        );
    }

    #[tokio::test]
    async fn test_update_one_unknown_id() {
        let result = service()
            .update_one("missing", &ArtistUpdate::Name("x".into()))
            .await;
        assert!(matches!(result, Err(SyncError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_many_marks_saved() {
        let service = service();
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(service.create(band_a()).await.unwrap().id);
        }

        let updated = service
            .update_many(&ids, &ArtistUpdate::Saved(true))
            .await
            .unwrap();
        assert_eq!(updated, 3);

        for artist in service.list().await.unwrap() {
            assert_eq!(artist.saved, Some(true));
        }
    }

    #[tokio::test]
    async fn test_update_many_counts_unmatched_ids() {
        let service = service();
        let id = service.create(band_a()).await.unwrap().id;
        let ids = vec![id, "ghost".to_string()];

        let updated = service
            .update_many(&ids, &ArtistUpdate::Response(YesNo::Yes))
            .await
            .unwrap();
        assert_eq!(updated, 2);
    }

    /// Store that fails updates for one poisoned id
    struct FlakyStore {
        inner: MemoryArtistStore,
        poisoned: String,
    }

    #[async_trait]
    impl ArtistStore for FlakyStore {
        async fn find_all(&self) -> StoreResult<Vec<Artist>> {
            self.inner.find_all().await
        }

        async fn insert_one(&self, new: NewArtist) -> StoreResult<Artist> {
            self.inner.insert_one(new).await
        }

        async fn update_one_by_id(&self, id: &str, update: &ArtistUpdate) -> StoreResult<bool> {
            if id == self.poisoned {
                return Err(StoreError::Closed);
            }
            self.inner.update_one_by_id(id, update).await
        }

        async fn find_one_by_id(&self, id: &str) -> StoreResult<Option<Artist>> {
            self.inner.find_one_by_id(id).await
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_partial_bulk_failure_keeps_other_writes() {
        let store = Arc::new(FlakyStore {
            inner: MemoryArtistStore::new(),
            poisoned: "poisoned".to_string(),
        });
        let service = SyncService::new(store.clone());

        let good = service.create(band_a()).await.unwrap().id;
        let ids = vec!["poisoned".to_string(), good.clone()];

        let result = service.update_many(&ids, &ArtistUpdate::Saved(true)).await;
        assert!(matches!(result, Err(SyncError::Store(_))));

        let stored = store.find_one_by_id(&good).await.unwrap().unwrap();
        assert_eq!(
            ArtistUpdate::read(ArtistField::Saved, &stored),
            ArtistUpdate::Saved(true)
        );
    }
}
