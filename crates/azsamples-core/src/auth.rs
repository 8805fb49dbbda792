//! Bearer tokens for Azure Resource Manager
//!
//! The factory turns a [`CredentialSource`](crate::config::CredentialSource)
//! into a [`TokenCredential`]. Client secret credentials talk to the token
//! endpoint lazily, on the first request that needs a token.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::CredentialSource;
use crate::error::{CoreError, Result};

/// Refresh this many seconds before the reported expiry
const EXPIRY_MARGIN_SECS: i64 = 300;

/// A bearer token and when it stops being valid
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Utc::now() + TimeDelta::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of bearer tokens for a scope
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// Hands out the same token for every scope
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_at: DateTime::<Utc>::MAX_UTC,
        })
    }
}

/// OAuth2 client-credentials flow against Microsoft Entra ID
pub struct ClientSecretCredential {
    http: reqwest::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    cache: Mutex<Option<(String, AccessToken)>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

impl ClientSecretCredential {
    pub fn new(
        http: reqwest::Client,
        authority_host: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            authority_host: authority_host.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cache: Mutex::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            urlencoding::encode(&self.tenant_id)
        )
    }

    async fn request_token(&self, scope: &str) -> Result<AccessToken> {
        let form = serde_urlencoded::to_string([
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ])
        .map_err(|e| CoreError::Credential(format!("Failed to encode token request: {}", e)))?;

        debug!(tenant = %self.tenant_id, client_id = %self.client_id, "Requesting access token");

        let response = self
            .http
            .post(self.token_url())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(form)
            .send()
            .await
            .map_err(|e| CoreError::Credential(format!("Token request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::Credential(format!("Token response unreadable: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<TokenErrorResponse>(&bytes)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).to_string());
            return Err(CoreError::Credential(format!(
                "Token request rejected ({}): {}",
                status.as_u16(),
                detail
            )));
        }

        let parsed: TokenResponse = serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Credential(format!("Malformed token response: {}", e)))?;
        let expires_at = i64::try_from(parsed.expires_in)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        trace!("Access token valid for {}s", parsed.expires_in);

        Ok(AccessToken {
            token: parsed.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let mut cache = self.cache.lock().await;
        if let Some((cached_scope, token)) = cache.as_ref()
            && cached_scope == scope
            && token.is_fresh()
        {
            return Ok(token.clone());
        }

        let token = self.request_token(scope).await?;
        *cache = Some((scope.to_string(), token.clone()));
        Ok(token)
    }
}

/// Build the credential for resolved settings
///
/// Empty credential fields are rejected here so that construction, not the
/// first request, reports incomplete credential material.
pub fn credential_from_source(
    source: &CredentialSource,
    http: reqwest::Client,
    authority_host: &str,
) -> Result<Arc<dyn TokenCredential>> {
    match source {
        CredentialSource::AccessToken(token) => {
            if token.trim().is_empty() {
                return Err(CoreError::Credential("access token is empty".to_string()));
            }
            Ok(Arc::new(StaticTokenCredential::new(token.clone())))
        }
        CredentialSource::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
        } => {
            for (name, value) in [
                ("tenant_id", tenant_id),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ] {
                if value.trim().is_empty() {
                    return Err(CoreError::Credential(format!("{} is empty", name)));
                }
            }
            Ok(Arc::new(ClientSecretCredential::new(
                http,
                authority_host,
                tenant_id.clone(),
                client_id.clone(),
                client_secret.clone(),
            )))
        }
    }
}
