use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A customer organization's data partition, keyed by the identity provider's
/// organization id and by a public slug.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub org_id: String,
    pub slug: Option<String>,
    pub name: String,
    pub business_name: Option<String>,
    pub business_description: Option<String>,
    pub email: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_account_id: Option<String>,
    pub plan_id: Option<Uuid>,
    /// Free-form integration metadata keyed by integration name
    pub integrations: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Name shown on public booking pages
    pub fn display_name(&self) -> &str {
        self.business_name.as_deref().unwrap_or(&self.name)
    }

    /// Names of connected integrations, payment processor first
    pub fn connected_integrations(&self) -> Vec<String> {
        let mut connected = Vec::new();

        if self.stripe_account_id.is_some() {
            connected.push("stripe".to_string());
        }

        if let Some(entries) = self.integrations.as_object() {
            for (name, meta) in entries {
                if name == "stripe" && !connected.is_empty() {
                    continue;
                }
                let is_connected = meta
                    .get("connected")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if is_connected {
                    connected.push(name.clone());
                }
            }
        }

        connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tenant(account: Option<&str>, integrations: Value) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            org_id: "org_1".to_string(),
            slug: Some("acme".to_string()),
            name: "Acme".to_string(),
            business_name: None,
            business_description: None,
            email: "owner@acme.test".to_string(),
            stripe_customer_id: None,
            stripe_account_id: account.map(str::to_string),
            plan_id: None,
            integrations,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn connected_integrations_reads_account_and_metadata() {
        let t = tenant(
            Some("acct_1"),
            json!({
                "google_calendar": { "connected": true },
                "zapier": { "connected": false },
                "stripe": { "connected": true }
            }),
        );
        assert_eq!(t.connected_integrations(), vec!["stripe", "google_calendar"]);
    }

    #[test]
    fn non_object_metadata_is_ignored() {
        let t = tenant(None, Value::Null);
        assert!(t.connected_integrations().is_empty());
        assert_eq!(t.display_name(), "Acme");
    }
}
