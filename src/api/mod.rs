//! REST API routes for festival contacts

pub mod artists;
pub mod auth;
pub mod error;

use actix_web::{get, web, HttpResponse, Responder};

pub use auth::AccessGate;
pub use error::ApiError;

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health)
        // Artist routes
        .service(web::scope("/artists").configure(artists::configure))
        // Artist routes (legacy prefix used by the browser client)
        .service(web::scope("/api/artists").configure(artists::configure))
        // Auth routes
        .service(web::scope("/auth").configure(auth::configure));
}

/// Malformed or mistyped JSON bodies become `{"error": ...}` 400s
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
