//! Authenticated App Store Connect HTTP client

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use std::sync::RwLock;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::{AscError, Result};

/// Base URL for App Store Connect API v1.
pub(crate) const API_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// JWT claims for App Store Connect API
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    iat: i64,
    exp: i64,
    aud: String,
}

/// Cached JWT token with expiration.
struct JwtCache {
    token: String,
    expires_at: DateTime<Utc>,
}

/// App Store Connect API client.
///
/// Shared by every publisher for the duration of a run; safe to use from
/// concurrent workers behind an `Arc`.
pub struct AscClient {
    credentials: Credentials,
    client: Client,
    jwt_cache: RwLock<Option<JwtCache>>,
}

impl AscClient {
    /// Create a new client from credentials
    pub fn new(credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            credentials,
            client,
            jwt_cache: RwLock::new(None),
        })
    }

    /// Generate a JWT token for API authentication, reusing a cached token
    /// while it remains valid (with a 5 minute refresh buffer).
    fn generate_jwt(&self) -> Result<String> {
        {
            let cache = self.jwt_cache.read().unwrap();
            if let Some(ref cached) = *cache {
                if Utc::now() < cached.expires_at - Duration::minutes(5) {
                    return Ok(cached.token.clone());
                }
            }
        }

        let now = Utc::now();
        let exp = now + Duration::minutes(20);

        let claims = Claims {
            iss: self.credentials.issuer_id.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            aud: "appstoreconnect-v1".to_string(),
        };

        let encoding_key = EncodingKey::from_ec_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AscError::InvalidCredentials(format!("Invalid API key: {}", e)))?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.credentials.key_id.clone());

        let token = encode(&header, &claims, &encoding_key)?;

        {
            let mut cache = self.jwt_cache.write().unwrap();
            *cache = Some(JwtCache {
                token: token.clone(),
                expires_at: exp,
            });
        }

        Ok(token)
    }

    /// Make an authenticated API request and decode the response body.
    pub(crate) async fn api_request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let token = self.generate_jwt()?;
        let url = format!("{}{}", API_BASE_URL, endpoint);

        debug!("API request: {} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AscError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let result = response.json().await?;
        Ok(result)
    }

    /// Make an authenticated API request that returns no content.
    pub(crate) async fn api_request_no_content(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<()> {
        let token = self.generate_jwt()?;
        let url = format!("{}{}", API_BASE_URL, endpoint);

        debug!("API request (no content): {} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() && status != StatusCode::NO_CONTENT {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AscError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(())
    }

    /// Raw reqwest handle, for pre-signed upload requests that bypass the
    /// JWT-authenticated API surface.
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }
}
