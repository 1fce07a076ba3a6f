use std::sync::Arc;

use crate::auth::{build_admin_gate, AdminGate, SessionVerifier};
use crate::config::AppConfig;
use crate::database::Store;
use crate::integrations::{
    CalendarProvider, ClerkDirectory, CloudinaryUploads, GoogleCalendar, IdentityDirectory,
    PaymentProvider, StripePayments, UploadProvider,
};

/// Everything a handler may touch, resolved once at start-up
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub sessions: Arc<SessionVerifier>,
    pub admin_gate: Arc<dyn AdminGate>,
    pub payments: Arc<dyn PaymentProvider>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub identity: Arc<dyn IdentityDirectory>,
    pub uploads: Arc<dyn UploadProvider>,
}

impl AppState {
    /// Wire the HTTP-backed providers from configuration
    pub fn from_config(config: AppConfig, store: Store) -> anyhow::Result<Self> {
        let payments = Arc::new(StripePayments::new(&config.billing)?);
        let calendar = Arc::new(GoogleCalendar::new(&config.calendar)?);
        let identity = Arc::new(ClerkDirectory::new(&config.identity)?);
        let uploads = Arc::new(CloudinaryUploads::new(&config.uploads)?);

        Self::with_providers(config, store, payments, calendar, identity, uploads)
    }

    pub fn with_providers(
        config: AppConfig,
        store: Store,
        payments: Arc<dyn PaymentProvider>,
        calendar: Arc<dyn CalendarProvider>,
        identity: Arc<dyn IdentityDirectory>,
        uploads: Arc<dyn UploadProvider>,
    ) -> anyhow::Result<Self> {
        let sessions = Arc::new(SessionVerifier::from_config(&config.security)?);
        let admin_gate = build_admin_gate(&config.security);

        tracing::info!(gate = admin_gate.name(), "Admin gate configured");

        Ok(Self {
            config: Arc::new(config),
            store,
            sessions,
            admin_gate,
            payments,
            calendar,
            identity,
            uploads,
        })
    }
}
