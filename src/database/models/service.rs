use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Minutes
    pub duration: i32,
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration: i32,
    pub price: Decimal,
    pub active: bool,
}

/// Partial update from the dashboard. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ServiceChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub duration: Option<i32>,
    pub price: Option<Decimal>,
    pub active: Option<bool>,
}

impl ServiceChanges {
    pub fn apply(&self, service: &mut Service) {
        if let Some(name) = &self.name {
            service.name = name.clone();
        }
        if let Some(description) = &self.description {
            service.description = description.clone();
        }
        if let Some(duration) = self.duration {
            service.duration = duration;
        }
        if let Some(price) = self.price {
            service.price = price;
        }
        if let Some(active) = self.active {
            service.active = active;
        }
    }
}

/// Projection exposed on public booking pages
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicService {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration: i32,
    pub price: Decimal,
}

impl From<Service> for PublicService {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            duration: service.duration,
            price: service.price,
        }
    }
}
