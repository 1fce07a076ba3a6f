use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideKind {
    /// Closed for the whole day
    Closed,
    /// Open with custom hours instead of the weekly schedule
    Custom,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::Closed => "closed",
            OverrideKind::Custom => "custom",
        }
    }
}

impl TryFrom<String> for OverrideKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "closed" => Ok(OverrideKind::Closed),
            "custom" => Ok(OverrideKind::Custom),
            other => Err(format!("unknown override type '{}'", other)),
        }
    }
}

/// Date-specific exception to a tenant's weekly availability
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityOverride {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub kind: OverrideKind,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOverride {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub kind: OverrideKind,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<String>,
}

/// Fully resolved replacement values for an existing override
#[derive(Debug, Clone)]
pub struct OverrideUpdate {
    pub kind: OverrideKind,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<String>,
}
