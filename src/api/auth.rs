//! Access gate for the artist routes
//!
//! When a password is configured, clients log in once and then present the
//! issued token as a bearer header or the `accesstoken` cookie. Without a
//! password every request passes.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::dev::Payload;
use actix_web::{post, web, FromRequest, HttpRequest, HttpResponse};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use crate::config::Settings;
use crate::utils::auth::{create_jwt, hash_password, verify_jwt, verify_password};

pub const ACCESS_COOKIE: &str = "accesstoken";
const TOKEN_SUBJECT: &str = "festival-contacts";

/// Password check and token issue/verify, shared by all workers
#[derive(Clone)]
pub struct AccessGate {
    password_hash: Option<String>,
    secret: String,
    max_age: i64,
}

impl AccessGate {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.access_password.as_deref(),
            &settings.server_id,
            settings.token_max_age_secs(),
        )
    }

    pub fn new(password: Option<&str>, secret: &str, max_age: i64) -> Self {
        Self {
            password_hash: password.map(|p| hash_password(p, secret)),
            secret: secret.to_string(),
            max_age,
        }
    }

    /// Gate that lets every request through
    #[cfg(test)]
    pub fn open() -> Self {
        Self::new(None, "", 0)
    }

    pub fn is_open(&self) -> bool {
        self.password_hash.is_none()
    }

    /// Exchange the password for an access token
    pub fn login(&self, password: &str) -> ApiResult<TokenResponse> {
        let hash = self
            .password_hash
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Access control is not enabled".to_string()))?;

        if !verify_password(password, &self.secret, hash) {
            return Err(ApiError::Unauthorized("Invalid password".to_string()));
        }

        let token = create_jwt(TOKEN_SUBJECT, &self.secret, self.max_age)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        Ok(TokenResponse {
            msg: "Logged in".to_string(),
            accesstoken: token,
            maxage: self.max_age,
        })
    }

    /// Accept the request if the gate is open or it carries a valid token
    pub fn check(&self, req: &HttpRequest) -> ApiResult<()> {
        if self.is_open() {
            return Ok(());
        }

        let token = access_token(req)?
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        verify_jwt(&token, &self.secret)
            .map(|_| ())
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))
    }
}

/// Extractor that rejects unauthenticated requests before the handler runs
pub struct Authorized;

impl FromRequest for Authorized {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AccessGate>>() {
            Some(gate) => gate.check(req).map(|_| Authorized),
            None => Ok(Authorized),
        };
        ready(result)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenResponse {
    pub msg: String,
    pub accesstoken: String,
    pub maxage: i64,
}

/// login endpoint
#[post("/login")]
pub async fn login(
    gate: web::Data<AccessGate>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let tokens = gate.login(&body.password)?;
    Ok(HttpResponse::Ok()
        .cookie(build_access_cookie(&tokens.accesstoken, tokens.maxage))
        .json(tokens))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login);
}

fn build_access_cookie(token: &str, max_age: i64) -> Cookie<'static> {
    Cookie::build(ACCESS_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(max_age))
        .finish()
}

/// Bearer header first, then the cookie
fn access_token(req: &HttpRequest) -> ApiResult<Option<String>> {
    if let Some(header_value) = req.headers().get("Authorization") {
        let header_str = header_value.to_str().unwrap_or("").trim();
        let token = header_str.strip_prefix("Bearer ").unwrap_or(header_str).trim();

        if token.is_empty() {
            return Err(ApiError::Unauthorized("Invalid token format".to_string()));
        }
        return Ok(Some(token.to_string()));
    }

    Ok(req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_open_gate_accepts_anything() {
        let gate = AccessGate::open();
        let req = TestRequest::default().to_http_request();
        assert!(gate.check(&req).is_ok());
        assert!(gate.login("whatever").is_err());
    }

    #[test]
    fn test_closed_gate_requires_token() {
        let gate = AccessGate::new(Some("backstage"), "server-id", 3600);
        let req = TestRequest::default().to_http_request();
        assert!(matches!(gate.check(&req), Err(ApiError::Unauthorized(_))));

        assert!(matches!(
            gate.login("wrong"),
            Err(ApiError::Unauthorized(_))
        ));

        let tokens = gate.login("backstage").unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", tokens.accesstoken)))
            .to_http_request();
        assert!(gate.check(&req).is_ok());

        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_COOKIE, tokens.accesstoken.clone()))
            .to_http_request();
        assert!(gate.check(&req).is_ok());

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_http_request();
        assert!(gate.check(&req).is_err());
    }
}
