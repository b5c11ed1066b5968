//! OAuth user-token authentication for Google APIs.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{GdocError, Result};
use crate::models::{TokenData, TokenResponse};

/// Google OAuth2 token endpoint, used when the token data carries none.
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Cached access token. `expires_at` is unknown for the stored token.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<SystemTime>,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at > SystemTime::now() + Duration::from_secs(60),
            None => true,
        }
    }
}

/// Authenticator for Google APIs using a stored OAuth user token.
#[derive(Clone)]
pub struct Authenticator {
    token: Arc<TokenData>,
    client: Client,
    cached_token: Arc<RwLock<CachedToken>>,
}

impl Authenticator {
    /// Create a new authenticator from the JSON token object.
    pub fn from_json(json: &str) -> Result<Self> {
        let token: TokenData = serde_json::from_str(json).map_err(GdocError::TokenParse)?;
        Ok(Self::new(token))
    }

    /// Create a new authenticator from token data.
    pub fn new(token: TokenData) -> Self {
        let cached = CachedToken {
            access_token: token.token.clone(),
            expires_at: None,
        };
        Self {
            token: Arc::new(token),
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(cached)),
        }
    }

    /// Scopes granted to the stored token.
    pub fn scopes(&self) -> &[String] {
        &self.token.scopes
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        let new_token = self.refresh_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = new_token.clone();
        }

        Ok(new_token.access_token)
    }

    /// Exchange the refresh token for a new access token.
    async fn refresh_token(&self) -> Result<CachedToken> {
        if self.token.refresh_token.is_empty() {
            return Err(GdocError::TokenRefresh(
                "access token is empty and no refresh token is available".to_string(),
            ));
        }

        let token_uri = if self.token.token_uri.is_empty() {
            DEFAULT_TOKEN_URI
        } else {
            self.token.token_uri.as_str()
        };
        debug!(token_uri, "refreshing access token");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.token.refresh_token.as_str()),
            ("client_id", self.token.client_id.as_str()),
            ("client_secret", self.token.client_secret.as_str()),
        ];

        let response = self.client.post(token_uri).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GdocError::TokenRefresh(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        let expires_at = token_response
            .expires_in
            .map(|secs| SystemTime::now() + Duration::from_secs(secs));

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}
