//! Service Account Authentication
//!
//! OAuth2 JWT-bearer flow: sign an RS256 assertion with the service account
//! key, exchange it for an access token, reuse the token until shortly
//! before it expires.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::StorageError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Upload/list access to files created by this app
pub const SCOPE_DRIVE_FILE: &str = "https://www.googleapis.com/auth/drive.file";

/// Read-only access, used by the dataset tool
pub const SCOPE_DRIVE_READONLY: &str = "https://www.googleapis.com/auth/drive.readonly";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime accepted by Google (max 1h)
const ASSERTION_TTL_SECS: i64 = 3600;

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Relevant fields of a service account JSON key
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json)
            .map_err(|e| StorageError::Credentials(format!("invalid service account key: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| StorageError::Credentials(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone)]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    /// Pre-issued bearer token, used as is
    StaticToken(String),
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

// ============================================================================
// TOKEN PROVIDER
// ============================================================================

pub struct TokenProvider {
    credentials: Credentials,
    scope: String,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(credentials: Credentials, scope: &str, http: reqwest::Client) -> Self {
        Self {
            credentials,
            scope: scope.to_string(),
            http,
            cached: RwLock::new(None),
        }
    }

    /// Current access token, exchanging a fresh assertion when needed
    pub async fn access_token(&self) -> Result<String, StorageError> {
        let key = match &self.credentials {
            Credentials::StaticToken(token) => return Ok(token.clone()),
            Credentials::ServiceAccount(key) => key,
        };

        let now = Utc::now();
        let cached = self.cached.read().clone();
        if let Some(cached) = cached.filter(|t| t.is_fresh(now)) {
            return Ok(cached.token);
        }

        let assertion = build_assertion(key, &self.scope, now)?;
        tracing::debug!("Exchanging service account assertion for {}", key.client_email);

        let response = self.http
            .post(&key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Token(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await
            .map_err(|e| StorageError::Parse(e.to_string()))?;

        let cached = CachedToken {
            token: token.access_token.clone(),
            expires_at: now + Duration::seconds(token.expires_in),
        };
        *self.cached.write() = Some(cached);

        Ok(token.access_token)
    }
}

/// Signed RS256 JWT asserting the service account identity
fn build_assertion(key: &ServiceAccountKey, scope: &str, now: DateTime<Utc>) -> Result<String, StorageError> {
    let claims = assertion_claims(key, scope, now);
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| StorageError::Credentials(format!("invalid private key: {}", e)))?;

    encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| StorageError::Token(e.to_string()))
}

fn assertion_claims<'a>(key: &'a ServiceAccountKey, scope: &'a str, now: DateTime<Utc>) -> AssertionClaims<'a> {
    let iat = now.timestamp();
    AssertionClaims {
        iss: &key.client_email,
        scope,
        aud: &key.token_uri,
        iat,
        exp: iat + ASSERTION_TTL_SECS,
    }
}
