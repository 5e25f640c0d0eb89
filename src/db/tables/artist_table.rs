//! Artist table operations

use async_trait::async_trait;
use sqlx::FromRow;

use crate::db::DbEngine;
use crate::models::{Artist, ArtistUpdate, NewArtist, YesNo};
use crate::stores::{new_record_id, ArtistStore, StoreError, StoreResult};

const COLUMNS: &str = "id, name, response, available, cost, saved";

/// Database row for artists
#[derive(Debug, FromRow)]
pub struct ArtistRow {
    pub id: String,
    pub name: String,
    pub response: String,
    pub available: String,
    pub cost: f64,
    pub saved: Option<bool>,
}

impl TryFrom<ArtistRow> for Artist {
    type Error = StoreError;

    fn try_from(row: ArtistRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: row.id.clone(),
            reason,
        };
        let response = YesNo::from_str(&row.response)
            .ok_or_else(|| corrupt(format!("response = {:?}", row.response)))?;
        let available = YesNo::from_str(&row.available)
            .ok_or_else(|| corrupt(format!("available = {:?}", row.available)))?;

        Ok(Artist {
            id: row.id,
            name: row.name,
            response,
            available,
            cost: row.cost,
            saved: row.saved,
        })
    }
}

/// SQLite-backed artist collection
pub struct ArtistTable {
    engine: DbEngine,
}

impl ArtistTable {
    pub fn new(engine: DbEngine) -> Self {
        Self { engine }
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.engine.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl ArtistStore for ArtistTable {
    async fn find_all(&self) -> StoreResult<Vec<Artist>> {
        self.check_open()?;
        let rows = sqlx::query_as::<_, ArtistRow>(&format!(
            "SELECT {} FROM {} ORDER BY seq",
            COLUMNS,
            self.engine.collection()
        ))
        .fetch_all(self.engine.pool())
        .await?;

        rows.into_iter().map(Artist::try_from).collect()
    }

    async fn insert_one(&self, new: NewArtist) -> StoreResult<Artist> {
        self.check_open()?;
        let id = new_record_id();

        sqlx::query(&format!(
            "INSERT INTO {} (id, name, response, available, cost) VALUES (?, ?, ?, ?, ?)",
            self.engine.collection()
        ))
        .bind(&id)
        .bind(&new.name)
        .bind(new.response.as_str())
        .bind(new.available.as_str())
        .bind(new.cost)
        .execute(self.engine.pool())
        .await?;

        self.find_one_by_id(&id)
            .await?
            .ok_or_else(|| StoreError::Corrupt {
                id,
                reason: "inserted record could not be read back".to_string(),
            })
    }

    async fn update_one_by_id(&self, id: &str, update: &ArtistUpdate) -> StoreResult<bool> {
        self.check_open()?;
        // column names come from the closed ArtistField set
        let sql = format!(
            "UPDATE {} SET {} = ? WHERE id = ?",
            self.engine.collection(),
            update.field().as_str()
        );

        let query = sqlx::query(&sql);
        let query = match update {
            ArtistUpdate::Name(name) => query.bind(name.as_str()),
            ArtistUpdate::Response(v) | ArtistUpdate::Available(v) => query.bind(v.as_str()),
            ArtistUpdate::Cost(cost) => query.bind(*cost),
            ArtistUpdate::Saved(saved) => query.bind(*saved),
        };

        let result = query.bind(id).execute(self.engine.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_one_by_id(&self, id: &str) -> StoreResult<Option<Artist>> {
        self.check_open()?;
        let row = sqlx::query_as::<_, ArtistRow>(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            COLUMNS,
            self.engine.collection()
        ))
        .bind(id)
        .fetch_optional(self.engine.pool())
        .await?;

        row.map(Artist::try_from).transpose()
    }

    async fn close(&self) {
        self.engine.close().await;
    }
}
