use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{BalanceUpdate, Customer, CustomerId, EntryId, LedgerEntry};

use super::{AppError, ClientConfig};

/// Header the back office uses to tell AJAX calls from page navigations.
pub const XHR_HEADER: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// Payload of the unsettled-entries query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerEntries {
    /// Absent when no customer is selected
    #[serde(rename = "cliente", default)]
    pub customer: Option<Customer>,
    #[serde(rename = "movimenti", default)]
    pub entries: Vec<LedgerEntry>,
}

/// Payload of a settle call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettleResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "cliente", default)]
    pub customer: Option<BalanceUpdate>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Remote operations the settlement workflow depends on.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Fetch a customer and their unsettled entries.
    async fn customer_entries(&self, customer: CustomerId) -> Result<CustomerEntries, AppError>;

    /// Mark one entry as settled.
    async fn settle_entry(&self, entry: EntryId) -> Result<SettleResponse, AppError>;
}

/// [`LedgerApi`] over HTTP.
pub struct HttpLedgerClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpLedgerClient {
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    async fn error_from(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        AppError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl LedgerApi for HttpLedgerClient {
    async fn customer_entries(&self, customer: CustomerId) -> Result<CustomerEntries, AppError> {
        let url = self.config.url("/api/movimenti-cliente/");
        debug!(%url, customer, "fetching unsettled entries");

        let response = self
            .client
            .get(&url)
            .query(&[("cliente_id", customer)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::CustomerNotFound(customer));
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let mut payload: CustomerEntries = response
            .json()
            .await
            .map_err(|e| AppError::Decode(e.to_string()))?;
        payload.entries = payload
            .entries
            .into_iter()
            .map(LedgerEntry::normalized)
            .collect();
        Ok(payload)
    }

    async fn settle_entry(&self, entry: EntryId) -> Result<SettleResponse, AppError> {
        let url = self.config.url(&format!("/movimenti/{}/salda/", entry));
        debug!(%url, entry, "settling entry");

        let response = self
            .client
            .get(&url)
            .header(XHR_HEADER.0, XHR_HEADER.1)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let payload: SettleResponse = response
            .json()
            .await
            .map_err(|e| AppError::Decode(e.to_string()))?;

        if payload.success == Some(false) {
            return Err(AppError::SettleRejected(
                entry,
                payload
                    .message
                    .unwrap_or_else(|| "settle refused".to_string()),
            ));
        }
        Ok(payload)
    }
}
