use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{
    check_status, http_client, http_error, CatalogEntry, CatalogPrices, PaymentProvider,
    ProviderError, ProviderResult,
};
use crate::config::BillingConfig;

const PROVIDER: &str = "payment processor";
const CURRENCY: &str = "usd";

#[derive(Debug, Deserialize)]
struct PortalSession {
    url: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

fn decode_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Decode {
        provider: PROVIDER,
        message: e.to_string(),
    }
}

pub struct StripePayments {
    client: reqwest::Client,
    api_base: Url,
    connect_base: Url,
    secret_key: String,
    client_id: String,
    return_url: String,
}

impl StripePayments {
    pub fn new(config: &BillingConfig) -> ProviderResult<Self> {
        Ok(Self {
            client: http_client(30),
            api_base: Url::parse(&config.api_base)?,
            connect_base: Url::parse(&config.connect_base)?,
            secret_key: config.secret_key.clone(),
            client_id: config.connect_client_id.clone(),
            return_url: config.portal_return_url.clone(),
        })
    }

    fn secret(&self) -> ProviderResult<&str> {
        if self.secret_key.is_empty() {
            return Err(ProviderError::NotConfigured { provider: PROVIDER });
        }
        Ok(&self.secret_key)
    }

    /// Form-encoded POST to the API, returning the created object's id
    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> ProviderResult<String> {
        let endpoint = self.api_base.join(path)?;

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(self.secret()?)
            .form(form)
            .send()
            .await
            .map_err(http_error(PROVIDER))?;

        let created: Created = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(created.id)
    }

    async fn create_price(
        &self,
        product_id: &str,
        entry: &CatalogEntry,
        amount: i32,
        interval: &str,
        period: &str,
    ) -> ProviderResult<String> {
        self.post_form(
            "/v1/prices",
            &[
                ("product", product_id.to_string()),
                ("unit_amount", amount.to_string()),
                ("currency", CURRENCY.to_string()),
                ("recurring[interval]", interval.to_string()),
                ("metadata[plan_slug]", entry.slug.clone()),
                ("metadata[billing_period]", period.to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl PaymentProvider for StripePayments {
    async fn create_portal_session(&self, customer_id: &str) -> ProviderResult<String> {
        let endpoint = self.api_base.join("/v1/billing_portal/sessions")?;

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(self.secret()?)
            .form(&[("customer", customer_id), ("return_url", self.return_url.as_str())])
            .send()
            .await
            .map_err(http_error(PROVIDER))?;

        let session: PortalSession = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;

        Ok(session.url)
    }

    async fn deauthorize_account(&self, account_id: &str) -> ProviderResult<()> {
        let endpoint = self.connect_base.join("/oauth/deauthorize")?;

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(self.secret()?)
            .form(&[("client_id", self.client_id.as_str()), ("stripe_user_id", account_id)])
            .send()
            .await
            .map_err(http_error(PROVIDER))?;

        check_status(PROVIDER, response).await?;
        tracing::info!(account_id, "Deauthorized connected account");
        Ok(())
    }

    async fn create_catalog_entry(&self, entry: &CatalogEntry) -> ProviderResult<CatalogPrices> {
        let mut product = vec![
            ("name", entry.name.clone()),
            ("metadata[plan_slug]", entry.slug.clone()),
        ];
        if let Some(description) = entry.description.as_ref().filter(|d| !d.is_empty()) {
            product.push(("description", description.clone()));
        }
        let product_id = self.post_form("/v1/products", &product).await?;

        let monthly_price_id = self
            .create_price(&product_id, entry, entry.price_monthly, "month", "monthly")
            .await?;

        let yearly_price_id = match entry.price_yearly {
            Some(amount) => Some(
                self.create_price(&product_id, entry, amount, "year", "yearly")
                    .await?,
            ),
            None => None,
        };

        tracing::info!(product_id = %product_id, slug = %entry.slug, "Created catalog product");
        Ok(CatalogPrices {
            product_id,
            monthly_price_id,
            yearly_price_id,
        })
    }

    async fn archive_product(&self, product_id: &str, price_ids: &[String]) -> ProviderResult<()> {
        let inactive = [("active", "false".to_string())];

        self.post_form(&format!("/v1/products/{}", product_id), &inactive)
            .await?;
        for price_id in price_ids {
            self.post_form(&format!("/v1/prices/{}", price_id), &inactive)
                .await?;
        }

        tracing::info!(product_id, prices = price_ids.len(), "Archived catalog product");
        Ok(())
    }
}
