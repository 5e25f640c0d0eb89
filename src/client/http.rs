//! HTTP client for a festival contacts server

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{Artist, ArtistUpdate, NewArtist};

/// Errors that can occur when talking to the server
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Operations the client state controller needs from the server
#[async_trait]
pub trait ArtistApi: Send + Sync {
    async fn list(&self) -> ClientResult<Vec<Artist>>;

    async fn create(&self, draft: &NewArtist) -> ClientResult<Artist>;

    async fn update_one(&self, id: &str, update: &ArtistUpdate) -> ClientResult<Artist>;

    async fn update_many(&self, ids: &[String], update: &ArtistUpdate) -> ClientResult<usize>;
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    updated: usize,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    accesstoken: String,
}

/// reqwest-backed `ArtistApi`
pub struct HttpArtistClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpArtistClient {
    pub fn new(url: &str) -> ClientResult<Self> {
        if url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("festival-contacts/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Exchange the access password for a token used on later calls
    pub async fn login(&self, password: &str) -> ClientResult<()> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .send(self.http.post(&url).json(&json!({ "password": password })))
            .await?;
        let login: LoginResponse = parse(response).await?;
        *self.token.write() = Some(login.accesstoken);
        Ok(())
    }

    fn artists_url(&self) -> String {
        format!("{}/artists", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let token = self.token.read().clone();
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ClientError::Unreachable(e.to_string())
            } else {
                ClientError::Request(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(text);
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    response
        .json()
        .await
        .map_err(|e| ClientError::Parse(e.to_string()))
}

#[async_trait]
impl ArtistApi for HttpArtistClient {
    async fn list(&self) -> ClientResult<Vec<Artist>> {
        let response = self.send(self.http.get(self.artists_url())).await?;
        parse(response).await
    }

    async fn create(&self, draft: &NewArtist) -> ClientResult<Artist> {
        let response = self
            .send(self.http.post(self.artists_url()).json(draft))
            .await?;
        parse(response).await
    }

    async fn update_one(&self, id: &str, update: &ArtistUpdate) -> ClientResult<Artist> {
        debug!(id, field = %update.field(), "sending single update");
        let url = format!("{}/{}", self.artists_url(), id);
        let response = self
            .send(self.http.patch(url).json(&update.to_patch()))
            .await?;
        parse(response).await
    }

    async fn update_many(&self, ids: &[String], update: &ArtistUpdate) -> ClientResult<usize> {
        debug!(count = ids.len(), field = %update.field(), "sending bulk update");
        let body = json!({
            "ids": ids,
            "field": update.field(),
            "value": update.value(),
        });
        let response = self
            .send(self.http.patch(self.artists_url()).json(&body))
            .await?;
        let bulk: BulkResponse = parse(response).await?;
        Ok(bulk.updated)
    }
}
