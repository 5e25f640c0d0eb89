//! In-memory artist store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{new_record_id, ArtistStore, StoreError, StoreResult};
use crate::models::{Artist, ArtistUpdate, NewArtist};

#[derive(Default)]
struct Inner {
    /// Ids in insertion order
    order: Vec<String>,
    /// All artists by id
    artists: HashMap<String, Artist>,
    closed: bool,
}

/// Process-local store, lost on restart
#[derive(Default)]
pub struct MemoryArtistStore {
    inner: RwLock<Inner>,
}

impl MemoryArtistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtistStore for MemoryArtistStore {
    async fn find_all(&self) -> StoreResult<Vec<Artist>> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.artists.get(id).cloned())
            .collect())
    }

    async fn insert_one(&self, new: NewArtist) -> StoreResult<Artist> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(StoreError::Closed);
        }

        let artist = Artist::from_new(new_record_id(), new);
        inner.order.push(artist.id.clone());
        inner.artists.insert(artist.id.clone(), artist.clone());
        Ok(artist)
    }

    async fn update_one_by_id(&self, id: &str, update: &ArtistUpdate) -> StoreResult<bool> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(StoreError::Closed);
        }

        match inner.artists.get_mut(id) {
            Some(artist) => {
                update.apply(artist);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_one_by_id(&self, id: &str) -> StoreResult<Option<Artist>> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(inner.artists.get(id).cloned())
    }

    async fn close(&self) {
        self.inner.write().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YesNo;

    #[tokio::test]
    async fn test_insert_keeps_natural_order() {
        let store = MemoryArtistStore::new();
        let a = store.insert_one(NewArtist::named("A")).await.unwrap();
        let b = store.insert_one(NewArtist::named("B")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());

        let names: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(store.inner.read().order.len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_id_is_noop() {
        let store = MemoryArtistStore::new();
        let matched = store
            .update_one_by_id("nope", &ArtistUpdate::Response(YesNo::Yes))
            .await
            .unwrap();
        assert!(!matched);
        assert!(store.find_one_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_calls() {
        let store = MemoryArtistStore::new();
        store.close().await;
        assert!(matches!(store.find_all().await, Err(StoreError::Closed)));
    }
}
