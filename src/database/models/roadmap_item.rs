use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapStatus {
    Planned,
    InProgress,
    Completed,
    Archived,
}

impl RoadmapStatus {
    pub const ALL: [RoadmapStatus; 4] = [
        RoadmapStatus::Planned,
        RoadmapStatus::InProgress,
        RoadmapStatus::Completed,
        RoadmapStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoadmapStatus::Planned => "planned",
            RoadmapStatus::InProgress => "in_progress",
            RoadmapStatus::Completed => "completed",
            RoadmapStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Whether items in this status appear on the public roadmap
    pub fn is_public(&self) -> bool {
        !matches!(self, RoadmapStatus::Archived)
    }
}

impl TryFrom<String> for RoadmapStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown roadmap status '{}'", value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: RoadmapStatus,
    pub category: Option<String>,
    pub votes: i32,
    pub priority: i32,
    pub target_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRoadmapItem {
    pub title: String,
    pub description: Option<String>,
    pub status: RoadmapStatus,
    pub category: Option<String>,
    pub priority: i32,
    pub target_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}

/// Admin edits; only these fields can change through the API
#[derive(Debug, Clone, Default)]
pub struct RoadmapChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<RoadmapStatus>,
    pub category: Option<Option<String>>,
    pub priority: Option<i32>,
    pub target_date: Option<Option<DateTime<Utc>>>,
}

impl RoadmapChanges {
    /// Apply to an item in place; moving into `completed` stamps `completed_at`
    pub fn apply(&self, item: &mut RoadmapItem, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(status) = self.status {
            if status == RoadmapStatus::Completed && item.status != RoadmapStatus::Completed {
                item.completed_at = Some(now);
            }
            item.status = status;
        }
        if let Some(category) = &self.category {
            item.category = category.clone();
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(target_date) = self.target_date {
            item.target_date = target_date;
        }
        item.updated_at = now;
    }
}
