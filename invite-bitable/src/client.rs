//! HTTP client for the bitable record endpoints.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use invite_core::{Config, Record, RecordId, TableRef, DEFAULT_WRITE_TIMEOUT};

use crate::auth::TokenProvider;
use crate::error::{http_err, BitableError};
use crate::service::TableService;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`BitableClient`].
#[derive(Debug, Clone)]
pub struct BitableOptions {
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,
    /// Applied to record updates only; reads have no request timeout.
    pub write_timeout: Duration,
}

impl BitableOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            write_timeout: config.write_timeout,
        }
    }
}

impl Default for BitableOptions {
    fn default() -> Self {
        Self {
            base_url: invite_core::config::DEFAULT_BASE_URL.to_string(),
            app_id: String::new(),
            app_secret: String::new(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct RecordPage {
    #[serde(default)]
    items: Option<Vec<Record>>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    fields: &'a Map<String, Value>,
}

/// Production [`TableService`] backed by the Feishu open API.
pub struct BitableClient {
    http: reqwest::Client,
    base_url: String,
    write_timeout: Duration,
    tokens: TokenProvider,
}

impl BitableClient {
    pub fn new(options: BitableOptions) -> Result<Self, BitableError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| http_err("client builder", e))?;
        let base_url = options.base_url.trim_end_matches('/').to_string();
        let tokens = TokenProvider::new(
            http.clone(),
            &base_url,
            options.app_id,
            options.app_secret,
        );
        Ok(Self {
            http,
            base_url,
            write_timeout: options.write_timeout,
            tokens,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BitableError> {
        Self::new(BitableOptions::from_config(config))
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    fn records_url(&self, table: &TableRef) -> String {
        format!(
            "{}/open-apis/bitable/v1/apps/{}/tables/{}/records",
            self.base_url, table.app_token, table.table_id
        )
    }

    fn record_url(&self, table: &TableRef, record_id: &RecordId) -> String {
        format!("{}/{}", self.records_url(table), record_id)
    }
}

#[async_trait]
impl TableService for BitableClient {
    async fn list_records(&self, table: &TableRef) -> Result<Vec<Record>, BitableError> {
        let url = self.records_url(table);
        let page = self.authorized(|token| self.fetch_page(&url, token)).await?;
        let Some(page) = page else {
            return Ok(Vec::new());
        };

        let records = page.items.unwrap_or_default();
        if page.has_more {
            tracing::warn!(
                table = %table,
                fetched = records.len(),
                total = ?page.total,
                "table has more records than one page; only the first page is used",
            );
        }
        tracing::debug!(table = %table, records = records.len(), "listed bitable records");
        Ok(records)
    }

    async fn update_record(
        &self,
        table: &TableRef,
        record_id: &RecordId,
        fields: Map<String, Value>,
    ) -> Result<(), BitableError> {
        let url = self.record_url(table, record_id);
        self.authorized(|token| self.put_fields(&url, token, &fields)).await
    }
}

impl BitableClient {
    /// Run `call` with the cached tenant token. When the service refuses
    /// that token, drop it and run `call` once more with a fresh one.
    async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, BitableError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, BitableError>>,
    {
        let token = self.tokens.token().await?;
        match call(token.clone()).await {
            Err(err) if err.is_token_rejected() => {
                tracing::warn!(error = %err, "tenant token rejected; retrying with a new one");
                self.tokens.reject(&token).await;
                call(self.tokens.token().await?).await
            }
            result => result,
        }
    }

    async fn fetch_page(
        &self,
        url: &str,
        token: String,
    ) -> Result<Option<RecordPage>, BitableError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| http_err(url, e))?;

        let envelope: Envelope<RecordPage> = read_json(url, response).await?;
        check_code(url, envelope)
    }

    async fn put_fields(
        &self,
        url: &str,
        token: String,
        fields: &Map<String, Value>,
    ) -> Result<(), BitableError> {
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .timeout(self.write_timeout)
            .json(&UpdateBody { fields })
            .send()
            .await
            .map_err(|e| http_err(url, e))?;

        let envelope: Envelope<Value> = read_json(url, response).await?;
        check_code(url, envelope)?;
        Ok(())
    }
}

fn check_code<T>(endpoint: &str, envelope: Envelope<T>) -> Result<Option<T>, BitableError> {
    if envelope.code != 0 {
        return Err(BitableError::Api {
            endpoint: endpoint.to_string(),
            code: envelope.code,
            msg: envelope.msg,
        });
    }
    Ok(envelope.data)
}

/// Reject non-2xx responses, then decode the body as `T`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<T, BitableError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| http_err(endpoint, e))?;
    if !status.is_success() {
        return Err(BitableError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|source| BitableError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}
