use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub billing: BillingConfig,
    pub calendar: CalendarConfig,
    pub identity: IdentityConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Attach internal error detail to 5xx bodies
    pub expose_error_detail: bool,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

/// Which single mechanism decides admin access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminGateKind {
    AllowList,
    SessionCookie,
}

impl AdminGateKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allow_list" | "allowlist" | "user_ids" => Some(AdminGateKind::AllowList),
            "session_cookie" | "cookie" => Some(AdminGateKind::SessionCookie),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    /// HS256 secret for identity provider session tokens
    pub session_jwt_secret: String,
    /// RS256 PEM public key; takes precedence over the secret when set
    pub session_jwt_public_key: Option<String>,
    pub session_cookie_name: String,
    pub admin_gate: AdminGateKind,
    pub admin_user_ids: Vec<String>,
    pub admin_cookie_name: String,
    pub admin_cookie_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub api_base: String,
    /// Host for connected-account OAuth calls
    pub connect_base: String,
    pub secret_key: String,
    pub connect_client_id: String,
    pub portal_return_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub api_base: String,
    pub access_token: String,
    pub calendar_id: String,
    pub slot_interval_minutes: u32,
    pub default_duration_minutes: u32,
    pub lead_time_hours: u32,
    /// Offset of the business-hours schedule from UTC
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub api_base: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub api_base: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub max_image_bytes: usize,
    pub max_video_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value source (the process env in `from_env`)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("CLIENTFLOW_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("API_EXPOSE_ERROR_DETAIL") {
            self.server.expose_error_detail = v.parse().unwrap_or(self.server.expose_error_detail);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Some(v) = lookup("SESSION_JWT_SECRET") {
            self.security.session_jwt_secret = v;
        }
        if let Some(v) = lookup("SESSION_JWT_PUBLIC_KEY") {
            self.security.session_jwt_public_key = Some(v.replace("\\n", "\n"));
        }
        if let Some(v) = lookup("SESSION_COOKIE_NAME") {
            self.security.session_cookie_name = v;
        }
        if let Some(v) = lookup("ADMIN_GATE") {
            match AdminGateKind::parse(&v) {
                Some(kind) => self.security.admin_gate = kind,
                None => tracing::warn!("Ignoring unknown ADMIN_GATE value '{}'", v),
            }
        }
        if let Some(v) = lookup("ADMIN_USER_IDS") {
            self.security.admin_user_ids = split_list(&v);
        }
        if let Some(v) = lookup("ADMIN_COOKIE_NAME") {
            self.security.admin_cookie_name = v;
        }
        if let Some(v) = lookup("ADMIN_COOKIE_VALUE") {
            self.security.admin_cookie_value = v;
        }

        // Billing overrides
        if let Some(v) = lookup("STRIPE_API_BASE") {
            self.billing.api_base = v;
        }
        if let Some(v) = lookup("STRIPE_CONNECT_BASE") {
            self.billing.connect_base = v;
        }
        if let Some(v) = lookup("STRIPE_SECRET_KEY") {
            self.billing.secret_key = v;
        }
        if let Some(v) = lookup("STRIPE_CONNECT_CLIENT_ID") {
            self.billing.connect_client_id = v;
        }
        if let Some(v) = lookup("BILLING_PORTAL_RETURN_URL") {
            self.billing.portal_return_url = v;
        }

        // Calendar overrides
        if let Some(v) = lookup("CALENDAR_API_BASE") {
            self.calendar.api_base = v;
        }
        if let Some(v) = lookup("CALENDAR_ACCESS_TOKEN") {
            self.calendar.access_token = v;
        }
        if let Some(v) = lookup("CALENDAR_ID") {
            self.calendar.calendar_id = v;
        }
        if let Some(v) = lookup("CALENDAR_SLOT_INTERVAL_MINUTES") {
            self.calendar.slot_interval_minutes = v.parse().unwrap_or(self.calendar.slot_interval_minutes);
        }
        if let Some(v) = lookup("CALENDAR_LEAD_TIME_HOURS") {
            self.calendar.lead_time_hours = v.parse().unwrap_or(self.calendar.lead_time_hours);
        }
        if let Some(v) = lookup("CALENDAR_UTC_OFFSET_MINUTES") {
            self.calendar.utc_offset_minutes = v.parse().unwrap_or(self.calendar.utc_offset_minutes);
        }

        // Identity overrides
        if let Some(v) = lookup("IDENTITY_API_BASE") {
            self.identity.api_base = v;
        }
        if let Some(v) = lookup("IDENTITY_SECRET_KEY") {
            self.identity.secret_key = v;
        }

        // Upload overrides
        if let Some(v) = lookup("UPLOAD_API_BASE") {
            self.uploads.api_base = v;
        }
        if let Some(v) = lookup("UPLOAD_CLOUD_NAME") {
            self.uploads.cloud_name = v;
        }
        if let Some(v) = lookup("UPLOAD_API_KEY") {
            self.uploads.api_key = v;
        }
        if let Some(v) = lookup("UPLOAD_API_SECRET") {
            self.uploads.api_secret = v;
        }
        if let Some(v) = lookup("UPLOAD_MAX_IMAGE_BYTES") {
            self.uploads.max_image_bytes = v.parse().unwrap_or(self.uploads.max_image_bytes);
        }
        if let Some(v) = lookup("UPLOAD_MAX_VIDEO_BYTES") {
            self.uploads.max_video_bytes = v.parse().unwrap_or(self.uploads.max_video_bytes);
        }

        self
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                expose_error_detail: true,
                enable_request_logging: true,
                max_request_size_bytes: 110 * 1024 * 1024, // videos go through /api/upload
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                session_jwt_secret: String::new(),
                session_jwt_public_key: None,
                session_cookie_name: "__session".to_string(),
                admin_gate: AdminGateKind::AllowList,
                admin_user_ids: Vec::new(),
                admin_cookie_name: "admin_session".to_string(),
                admin_cookie_value: "authenticated".to_string(),
            },
            billing: BillingConfig::defaults("http://localhost:3000/dashboard/settings/billing"),
            calendar: CalendarConfig::defaults(),
            identity: IdentityConfig {
                api_base: "https://api.clerk.com/v1".to_string(),
                secret_key: String::new(),
            },
            uploads: UploadConfig::defaults(),
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.server.expose_error_detail = false;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.database.run_migrations = false;
        config.security.cors_origins = vec!["https://staging.clientflow.app".to_string()];
        config.billing.portal_return_url = "https://staging.clientflow.app/dashboard/settings/billing".to_string();
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.server.expose_error_detail = false;
        config.server.enable_request_logging = false;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.run_migrations = false;
        config.security.cors_origins = vec!["https://clientflow.app".to_string()];
        config.billing.portal_return_url = "https://clientflow.app/dashboard/settings/billing".to_string();
        config
    }
}

impl BillingConfig {
    fn defaults(portal_return_url: &str) -> Self {
        Self {
            api_base: "https://api.stripe.com".to_string(),
            connect_base: "https://connect.stripe.com".to_string(),
            secret_key: String::new(),
            connect_client_id: String::new(),
            portal_return_url: portal_return_url.to_string(),
        }
    }
}

impl CalendarConfig {
    fn defaults() -> Self {
        Self {
            api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            access_token: String::new(),
            calendar_id: "primary".to_string(),
            slot_interval_minutes: 30,
            default_duration_minutes: 30,
            lead_time_hours: 24,
            utc_offset_minutes: 0,
        }
    }
}

impl UploadConfig {
    fn defaults() -> Self {
        Self {
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            max_image_bytes: 10 * 1024 * 1024,
            max_video_bytes: 100 * 1024 * 1024,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
