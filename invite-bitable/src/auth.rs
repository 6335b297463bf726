//! Tenant access token exchange with a small in-memory cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::client::read_json;
use crate::error::{http_err, BitableError};

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal/";

/// Tokens are refreshed this long before the server-side expiry.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(300);

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    tenant_access_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    expire: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Exchanges app credentials for a bearer token and reuses it until it is
/// close to expiring.
pub struct TokenProvider {
    http: reqwest::Client,
    endpoint: String,
    app_id: String,
    app_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: format!("{}{TOKEN_PATH}", base_url.trim_end_matches('/')),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            cached: Mutex::new(None),
        }
    }

    /// A valid bearer token, exchanging credentials only when the cached one
    /// is missing or about to expire.
    pub async fn token(&self) -> Result<String, BitableError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = self
            .exchange()
            .await
            .map_err(|err| BitableError::Auth(Box::new(err)))?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Forget `token` after the service refused it, so the next call
    /// exchanges credentials again. A token cached by a concurrent refresh
    /// is kept.
    pub async fn reject(&self, token: &str) {
        let mut cached = self.cached.lock().await;
        if cached.as_ref().is_some_and(|c| c.value == token) {
            tracing::info!("dropping rejected tenant access token");
            *cached = None;
        }
    }

    async fn exchange(&self) -> Result<CachedToken, BitableError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&TokenRequest {
                app_id: &self.app_id,
                app_secret: &self.app_secret,
            })
            .send()
            .await
            .map_err(|e| http_err(&self.endpoint, e))?;

        let body: TokenResponse = read_json(&self.endpoint, response).await?;
        let value = match (body.code, body.tenant_access_token) {
            (0, Some(token)) if !token.is_empty() => token,
            (code, _) => {
                return Err(BitableError::Api {
                    endpoint: self.endpoint.clone(),
                    code,
                    msg: if body.msg.is_empty() {
                        "no tenant_access_token in response".to_string()
                    } else {
                        body.msg
                    },
                })
            }
        };

        tracing::debug!(expire_secs = body.expire, "exchanged tenant access token");
        let lifetime = Duration::from_secs(body.expire).saturating_sub(REFRESH_MARGIN);
        Ok(CachedToken {
            value,
            refresh_at: Instant::now() + lifetime,
        })
    }
}
