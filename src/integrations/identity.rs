use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::{check_status, http_client, http_error, IdentityDirectory, ProviderError, ProviderResult};
use crate::config::IdentityConfig;

const PROVIDER: &str = "identity provider";

/// User directory of the identity provider
pub struct ClerkDirectory {
    client: reqwest::Client,
    users_endpoint: Url,
    secret_key: String,
}

impl ClerkDirectory {
    pub fn new(config: &IdentityConfig) -> ProviderResult<Self> {
        let base = format!("{}/", config.api_base.trim_end_matches('/'));
        Ok(Self {
            client: http_client(10),
            users_endpoint: Url::parse(&base)?.join("users")?,
            secret_key: config.secret_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityDirectory for ClerkDirectory {
    async fn email_registered(&self, email: &str) -> ProviderResult<bool> {
        if self.secret_key.is_empty() {
            return Err(ProviderError::NotConfigured { provider: PROVIDER });
        }

        let mut endpoint = self.users_endpoint.clone();
        endpoint
            .query_pairs_mut()
            .append_pair("email_address", email)
            .append_pair("limit", "1");

        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(http_error(PROVIDER))?;

        let users: Vec<Value> = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        Ok(!users.is_empty())
    }
}
