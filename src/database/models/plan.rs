use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription tier with pricing (minor units) and usage limits.
/// `None` limits mean unlimited.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub features: Json<Vec<String>>,
    pub price_monthly: i32,
    pub price_yearly: Option<i32>,
    pub stripe_product_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub stripe_price_id_yearly: Option<String>,
    pub max_contacts: Option<i32>,
    pub max_bookings: Option<i32>,
    pub max_services: Option<i32>,
    pub sort_order: i32,
    pub active: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields safe to show on the public pricing page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPlan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub price_monthly: i32,
    pub price_yearly: Option<i32>,
    pub max_contacts: Option<i32>,
    pub max_bookings: Option<i32>,
    pub max_services: Option<i32>,
    pub is_default: bool,
}

impl From<Plan> for PublicPlan {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            slug: plan.slug,
            description: plan.description,
            features: plan.features.0,
            price_monthly: plan.price_monthly,
            price_yearly: plan.price_yearly,
            max_contacts: plan.max_contacts,
            max_bookings: plan.max_bookings,
            max_services: plan.max_services,
            is_default: plan.is_default,
        }
    }
}

/// Plan created from the admin console, with the payment processor ids it
/// is sold under
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub price_monthly: i32,
    pub price_yearly: Option<i32>,
    pub stripe_product_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub stripe_price_id_yearly: Option<String>,
    pub max_contacts: Option<i32>,
    pub max_bookings: Option<i32>,
    pub max_services: Option<i32>,
    pub is_default: bool,
}

/// Lowercase ASCII words joined by single hyphens
pub fn plan_slug(name: &str) -> String {
    name.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Partial update applied by the admin console. Absent fields are untouched;
/// `Some(None)` on a nullable field clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanChanges {
    pub name: Option<String>,
    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,
    pub features: Option<Vec<String>>,
    #[serde(default, with = "double_option")]
    pub max_contacts: Option<Option<i32>>,
    #[serde(default, with = "double_option")]
    pub max_bookings: Option<Option<i32>>,
    #[serde(default, with = "double_option")]
    pub max_services: Option<Option<i32>>,
    pub active: Option<bool>,
    pub is_default: Option<bool>,
}

impl PlanChanges {
    pub fn apply(&self, plan: &mut Plan) {
        if let Some(name) = &self.name {
            plan.name = name.clone();
        }
        if let Some(description) = &self.description {
            plan.description = description.clone();
        }
        if let Some(features) = &self.features {
            plan.features = Json(features.clone());
        }
        if let Some(limit) = self.max_contacts {
            plan.max_contacts = limit;
        }
        if let Some(limit) = self.max_bookings {
            plan.max_bookings = limit;
        }
        if let Some(limit) = self.max_services {
            plan.max_services = limit;
        }
        if let Some(active) = self.active {
            plan.active = active;
        }
        if let Some(is_default) = self.is_default {
            plan.is_default = is_default;
        }
    }
}

/// Distinguishes a missing field from an explicit `null`
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
