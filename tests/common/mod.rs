#![allow(dead_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use clientflow::app;
use clientflow::config::AppConfig;
use clientflow::database::models::Tenant;
use clientflow::database::{MemoryStore, Store};
use clientflow::testing::{self, FakeProviders, TEST_ADMIN_ID};
use reqwest::RequestBuilder;

/// One app instance on its own port, backed by a fresh in-memory store
pub struct TestServer {
    pub base_url: String,
    pub store: MemoryStore,
    pub providers: FakeProviders,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(testing::test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        let store = MemoryStore::new();
        let providers = FakeProviders::default();
        let state = providers.state(config, Store::from_backend(store.clone()))?;

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app::router(state)).await;
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            providers,
            client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Seed a tenant and return it with a session token for its organization
    pub fn tenant(&self, org_id: &str, slug: &str) -> (Tenant, String) {
        let tenant = testing::tenant(org_id, slug);
        self.store.insert_tenant(tenant.clone());
        let token = testing::session_token(&format!("user_{}", slug), Some(org_id));
        (tenant, token)
    }

    pub fn admin_token(&self) -> String {
        testing::session_token(TEST_ADMIN_ID, None)
    }
}
