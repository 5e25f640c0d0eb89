//! Artist API routes
//!
//! `PATCH /artists` is the bulk update and always needs `ids`;
//! `PATCH /artists/{id}` updates one record and refuses bulk-shaped bodies.

use actix_web::{get, patch, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::auth::Authorized;
use super::error::{ApiError, ApiResult};
use crate::core::SyncService;
use crate::models::{ArtistUpdate, NewArtist};

const MISSING_IDS: &str = "Invalid PATCH request, missing ids for bulk update";
const MISSING_FIELD_OR_VALUE: &str = "Missing field or value";

#[derive(Debug, Deserialize)]
pub struct SingleUpdateBody {
    pub field: Option<String>,
    pub value: Option<Value>,
    pub ids: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateBody {
    pub ids: Option<Value>,
    pub field: Option<String>,
    pub value: Option<Value>,
}

/// Get all artists
#[get("")]
pub async fn list_artists(
    _auth: Authorized,
    service: web::Data<SyncService>,
) -> ApiResult<HttpResponse> {
    let artists = service.list().await?;
    Ok(HttpResponse::Ok().json(artists))
}

/// Create an artist
#[post("")]
pub async fn create_artist(
    _auth: Authorized,
    service: web::Data<SyncService>,
    body: web::Json<NewArtist>,
) -> ApiResult<HttpResponse> {
    let artist = service.create(body.into_inner()).await?;
    info!(id = %artist.id, "artist created");
    Ok(HttpResponse::Ok().json(artist))
}

/// Apply one field/value to many artists
#[patch("")]
pub async fn update_artists(
    _auth: Authorized,
    service: web::Data<SyncService>,
    body: web::Json<BulkUpdateBody>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let ids = parse_ids(body.ids.as_ref())?;
    let update = parse_update(body.field.as_deref(), body.value.as_ref())?;

    let updated = service.update_many(&ids, &update).await?;
    info!(count = updated, field = %update.field(), "bulk update applied");
    Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}

/// Update one field of one artist
#[patch("/{id}")]
pub async fn update_artist(
    _auth: Authorized,
    service: web::Data<SyncService>,
    path: web::Path<String>,
    body: web::Json<SingleUpdateBody>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let body = body.into_inner();

    if body.ids.is_some() {
        return Err(ApiError::BadRequest(
            "Bulk updates must be sent to the collection endpoint".to_string(),
        ));
    }

    let update = parse_update(body.field.as_deref(), body.value.as_ref())?;
    let artist = service.update_one(&id, &update).await?;
    Ok(HttpResponse::Ok().json(artist))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_artists)
        .service(create_artist)
        .service(update_artists)
        .service(update_artist);
}

fn parse_ids(ids: Option<&Value>) -> ApiResult<Vec<String>> {
    let ids = ids
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::BadRequest(MISSING_IDS.to_string()))?;

    ids.iter()
        .map(|id| {
            id.as_str()
                .map(str::to_string)
                .ok_or_else(|| ApiError::BadRequest("ids must be strings".to_string()))
        })
        .collect()
}

fn parse_update(field: Option<&str>, value: Option<&Value>) -> ApiResult<ArtistUpdate> {
    match (field, value) {
        (Some(field), Some(value)) => ArtistUpdate::from_parts(field, value)
            .map_err(|e| ApiError::BadRequest(e.to_string())),
        _ => Err(ApiError::BadRequest(MISSING_FIELD_OR_VALUE.to_string())),
    }
}
