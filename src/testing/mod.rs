//! Fixtures and in-process provider fakes for unit and integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::types::Json;
use uuid::Uuid;

use crate::auth::Claims;
use crate::config::{AdminGateKind, AppConfig};
use crate::database::models::{Plan, RoadmapItem, RoadmapStatus, Service, Tenant};
use crate::database::Store;
use crate::integrations::{
    BusyInterval, CalendarProvider, CatalogEntry, CatalogPrices, IdentityDirectory,
    PaymentProvider, ProviderError, ProviderResult, UploadProvider, UploadRequest, UploadedMedia,
};
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "clientflow-test-secret";
pub const TEST_ADMIN_ID: &str = "user_admin";

/// Development preset with a known session secret and one allow-listed admin
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.session_jwt_secret = TEST_JWT_SECRET.to_string();
    config.security.admin_gate = AdminGateKind::AllowList;
    config.security.admin_user_ids = vec![TEST_ADMIN_ID.to_string()];
    config.database.run_migrations = false;
    config
}

/// HS256 session token as the identity provider would issue it
pub fn session_token(user_id: &str, org_id: Option<&str>) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        org_id: org_id.map(str::to_string),
        email: None,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap_or_default()
}

pub fn tenant(org_id: &str, slug: &str) -> Tenant {
    let now = Utc::now();
    Tenant {
        id: Uuid::new_v4(),
        org_id: org_id.to_string(),
        slug: Some(slug.to_string()),
        name: slug.to_string(),
        business_name: Some(format!("{} Studio", slug)),
        business_description: None,
        email: format!("owner@{}.test", slug),
        stripe_customer_id: None,
        stripe_account_id: None,
        plan_id: None,
        integrations: json!({}),
        created_at: now,
        updated_at: now,
    }
}

pub fn plan(name: &str, sort_order: i32) -> Plan {
    let now = Utc::now();
    Plan {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: name.to_lowercase(),
        description: None,
        features: Json(vec![format!("{} support", name)]),
        price_monthly: 2900,
        price_yearly: None,
        stripe_product_id: Some(format!("prod_{}", name.to_lowercase())),
        stripe_price_id: Some(format!("price_{}", name.to_lowercase())),
        stripe_price_id_yearly: None,
        max_contacts: Some(100),
        max_bookings: Some(50),
        max_services: None,
        sort_order,
        active: true,
        is_default: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn service(tenant_id: Uuid, name: &str, active: bool) -> Service {
    let now = Utc::now();
    Service {
        id: Uuid::new_v4(),
        tenant_id,
        name: name.to_string(),
        description: None,
        duration: 60,
        price: Decimal::new(7500, 2),
        active,
        created_at: now,
        updated_at: now,
    }
}

pub fn roadmap_item(title: &str, status: RoadmapStatus, votes: i32, priority: i32) -> RoadmapItem {
    let now = Utc::now();
    RoadmapItem {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        status,
        category: None,
        votes,
        priority,
        target_date: None,
        completed_at: None,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

fn fake_failure(provider: &'static str) -> ProviderError {
    ProviderError::Status {
        provider,
        status: 503,
        body: "unavailable".to_string(),
    }
}

/// Records deauthorized accounts; can be switched to fail
#[derive(Default)]
pub struct FakePayments {
    pub deauthorized: Mutex<Vec<String>>,
    /// Slugs of created catalog entries
    pub catalog: Mutex<Vec<String>>,
    /// Archived product and price ids
    pub archived: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_portal_session(&self, customer_id: &str) -> ProviderResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(fake_failure("payments"));
        }
        Ok(format!("https://billing.test/session/{}", customer_id))
    }

    async fn deauthorize_account(&self, account_id: &str) -> ProviderResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(fake_failure("payments"));
        }
        self.deauthorized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(account_id.to_string());
        Ok(())
    }

    async fn create_catalog_entry(&self, entry: &CatalogEntry) -> ProviderResult<CatalogPrices> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(fake_failure("payments"));
        }
        self.catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.slug.clone());
        Ok(CatalogPrices {
            product_id: format!("prod_{}", entry.slug),
            monthly_price_id: format!("price_{}_monthly", entry.slug),
            yearly_price_id: entry
                .price_yearly
                .map(|_| format!("price_{}_yearly", entry.slug)),
        })
    }

    async fn archive_product(&self, product_id: &str, price_ids: &[String]) -> ProviderResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(fake_failure("payments"));
        }
        let mut archived = self.archived.lock().unwrap_or_else(PoisonError::into_inner);
        archived.push(product_id.to_string());
        archived.extend(price_ids.iter().cloned());
        Ok(())
    }
}

/// Fixed busy intervals; counts calls so tests can assert it was skipped
#[derive(Default)]
pub struct FakeCalendar {
    pub busy: Mutex<Vec<BusyInterval>>,
    pub calls: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
    pub fail: AtomicBool,
}

impl FakeCalendar {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn busy_intervals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ProviderResult<Vec<BusyInterval>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((from, to));
        if self.fail.load(Ordering::SeqCst) {
            return Err(fake_failure("calendar"));
        }
        Ok(self.busy.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

/// Emails in `registered` count as taken
#[derive(Default)]
pub struct FakeIdentity {
    pub registered: Mutex<Vec<String>>,
}

#[async_trait]
impl IdentityDirectory for FakeIdentity {
    async fn email_registered(&self, email: &str) -> ProviderResult<bool> {
        Ok(self
            .registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email)))
    }
}

/// Keeps every request it receives and answers with a predictable URL
#[derive(Default)]
pub struct FakeUploads {
    pub requests: Mutex<Vec<UploadRequest>>,
}

#[async_trait]
impl UploadProvider for FakeUploads {
    async fn upload(&self, request: UploadRequest) -> ProviderResult<UploadedMedia> {
        let media = UploadedMedia {
            url: format!("https://media.test/{}/{}", request.folder, request.public_id),
            public_id: format!("{}/{}", request.folder, request.public_id),
            resource_type: request.resource_type.as_str().to_string(),
        };
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Ok(media)
    }
}

/// The fakes behind one application state
#[derive(Clone, Default)]
pub struct FakeProviders {
    pub payments: Arc<FakePayments>,
    pub calendar: Arc<FakeCalendar>,
    pub identity: Arc<FakeIdentity>,
    pub uploads: Arc<FakeUploads>,
}

impl FakeProviders {
    /// Application state wired to these fakes
    pub fn state(&self, config: AppConfig, store: Store) -> anyhow::Result<AppState> {
        AppState::with_providers(
            config,
            store,
            self.payments.clone(),
            self.calendar.clone(),
            self.identity.clone(),
            self.uploads.clone(),
        )
    }
}
