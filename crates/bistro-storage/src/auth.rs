//! Service-account token signing
//!
//! The object store accepts OAuth bearer tokens. A [`CredentialSigner`] obtains them
//! with the JWT bearer grant: it signs an RS256 assertion with the service-account
//! key and exchanges it at the token endpoint. The resulting token is kept in a
//! [`TokenCache`] and reused until it is within [`TOKEN_REFRESH_MARGIN_SECS`] of expiry.

use async_trait::async_trait;
use bistro_core::constants::{
    ASSERTION_LIFETIME_SECS, JWT_BEARER_GRANT_TYPE, STORAGE_READ_WRITE_SCOPE,
    TOKEN_REFRESH_MARGIN_SECS,
};
use bistro_core::{ServiceAccountCredential, UploadConfig};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};

/// Token acquisition errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to import private key: {0}")]
    KeyImport(String),

    #[error("Failed to sign assertion: {0}")]
    Signing(String),

    #[error("Token exchange failed with status {status}: {body}")]
    Exchange { status: u16, body: String },

    #[error("Token exchange request failed: {0}")]
    Transport(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

/// Anything that can hand out a bearer token for the object store.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Claims of the signed assertion sent to the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub scope: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// An access token and the epoch second at which it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at_epoch_secs: u64,
}

impl CachedToken {
    /// Whether the token still has the refresh margin left at `now`.
    pub fn is_usable_at(&self, now_epoch_secs: u64) -> bool {
        // Inclusive: a token with exactly the margin left is still reused.
        now_epoch_secs.saturating_add(TOKEN_REFRESH_MARGIN_SECS) <= self.expires_at_epoch_secs
    }
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("value", &"<redacted>")
            .field("expires_at_epoch_secs", &self.expires_at_epoch_secs)
            .finish()
    }
}

/// Holds at most one token. Replaced wholesale on refresh.
///
/// The lock is only held to copy the token in or out, never across a network call,
/// so two cold callers may both refresh; the later write wins.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token value, if it is usable at `now`.
    pub async fn usable_at(&self, now_epoch_secs: u64) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|token| token.is_usable_at(now_epoch_secs))
            .map(|token| token.value.clone())
    }

    pub async fn replace(&self, token: CachedToken) {
        *self.slot.write().await = Some(token);
    }

    pub async fn current(&self) -> Option<CachedToken> {
        self.slot.read().await.clone()
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

/// Signs service-account assertions and exchanges them for access tokens.
pub struct CredentialSigner {
    credential: ServiceAccountCredential,
    token_uri: String,
    client: reqwest::Client,
    cache: Arc<TokenCache>,
    clock: Arc<dyn Clock>,
}

impl CredentialSigner {
    /// Create a signer with its own empty cache and the system clock.
    pub fn new(credential: ServiceAccountCredential, token_uri: impl Into<String>) -> Self {
        Self {
            credential,
            token_uri: token_uri.into(),
            client: reqwest::Client::new(),
            cache: Arc::new(TokenCache::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.credential().clone(), config.token_uri())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cache(mut self, cache: Arc<TokenCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Return a bearer token, refreshing it only when the cached one is too close to expiry.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let now = self.clock.now_epoch_secs();

        if let Some(token) = self.cache.usable_at(now).await {
            tracing::debug!("Reusing cached access token");
            return Ok(token);
        }

        let assertion = self.sign_assertion(now)?;
        let response = self.exchange(&assertion).await?;

        let expires_at_epoch_secs = now.saturating_add(response.expires_in);
        self.cache
            .replace(CachedToken {
                value: response.access_token.clone(),
                expires_at_epoch_secs,
            })
            .await;

        tracing::info!(
            issuer = %self.credential.issuer_email,
            expires_at = expires_at_epoch_secs,
            "Access token refreshed"
        );

        Ok(response.access_token)
    }

    pub(crate) fn claims_at(&self, now_epoch_secs: u64) -> AssertionClaims {
        AssertionClaims {
            iss: self.credential.issuer_email.clone(),
            sub: self.credential.issuer_email.clone(),
            aud: self.token_uri.clone(),
            scope: STORAGE_READ_WRITE_SCOPE.to_string(),
            iat: now_epoch_secs,
            exp: now_epoch_secs + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Build and RS256-sign the assertion for `now`.
    pub(crate) fn sign_assertion(&self, now_epoch_secs: u64) -> Result<String, AuthError> {
        let key = EncodingKey::from_rsa_pem(self.credential.private_key_pem.as_bytes())
            .map_err(|e| AuthError::KeyImport(e.to_string()))?;

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());

        encode(&header, &self.claims_at(now_epoch_secs), &key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    async fn exchange(&self, assertion: &str) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", assertion)])
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = status.as_u16(),
                token_uri = %self.token_uri,
                "Token exchange rejected"
            );
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        serde_json::from_str::<TokenResponse>(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("{}: {}", e, body)))
    }
}

#[async_trait]
impl TokenSource for CredentialSigner {
    async fn access_token(&self) -> Result<String, AuthError> {
        CredentialSigner::access_token(self).await
    }
}
