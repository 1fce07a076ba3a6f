//! Clients for the third-party services the API delegates to.
//!
//! Each provider sits behind a trait so handlers only see the operation they
//! need; the `reqwest` implementations are built once at start-up and share
//! one connection pool per provider.

pub mod calendar;
pub mod identity;
pub mod media;
pub mod stripe;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub use calendar::GoogleCalendar;
pub use identity::ClerkDirectory;
pub use media::CloudinaryUploads;
pub use stripe::StripePayments;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured")]
    NotConfigured { provider: &'static str },

    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unexpected response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("invalid provider endpoint: {0}")]
    Url(#[from] url::ParseError),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A plan as the payment processor sells it; prices in minor units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub price_monthly: i32,
    pub price_yearly: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPrices {
    pub product_id: String,
    pub monthly_price_id: String,
    pub yearly_price_id: Option<String>,
}

/// Billing portal sessions, connected accounts and the plan catalogue
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Returns the portal URL for the customer
    async fn create_portal_session(&self, customer_id: &str) -> ProviderResult<String>;

    /// Revoke the platform's access to a connected account
    async fn deauthorize_account(&self, account_id: &str) -> ProviderResult<()>;

    /// Create a product with a monthly (and optional yearly) recurring price
    async fn create_catalog_entry(&self, entry: &CatalogEntry) -> ProviderResult<CatalogPrices>;

    /// Deactivate a product and the given prices
    async fn archive_product(&self, product_id: &str, price_ids: &[String]) -> ProviderResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn busy_intervals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ProviderResult<Vec<BusyInterval>>;
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn email_registered(&self, email: &str) -> ProviderResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub folder: String,
    pub public_id: String,
    pub resource_type: ResourceType,
    pub tags: Vec<String>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub resource_type: String,
}

#[async_trait]
pub trait UploadProvider: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> ProviderResult<UploadedMedia>;
}

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("clientflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Turn a non-2xx response into `ProviderError::Status`
pub(crate) async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        provider,
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn http_error(provider: &'static str) -> impl Fn(reqwest::Error) -> ProviderError {
    move |source| ProviderError::Http { provider, source }
}
