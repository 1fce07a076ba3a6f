use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::database::models::{NewRoadmapItem, RoadmapItem, RoadmapStatus};

/// Public roadmap ordering: votes desc, then priority desc, then title
pub fn public_order(a: &RoadmapItem, b: &RoadmapItem) -> Ordering {
    b.votes
        .cmp(&a.votes)
        .then(b.priority.cmp(&a.priority))
        .then_with(|| a.title.cmp(&b.title))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupedRoadmap {
    pub planned: Vec<RoadmapItem>,
    pub in_progress: Vec<RoadmapItem>,
    pub completed: Vec<RoadmapItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicRoadmap {
    pub items: Vec<RoadmapItem>,
    pub grouped: GroupedRoadmap,
}

/// Drop archived items, sort, and bucket by status
pub fn public_roadmap(items: Vec<RoadmapItem>) -> PublicRoadmap {
    let mut items: Vec<RoadmapItem> = items.into_iter().filter(|i| i.status.is_public()).collect();
    items.sort_by(public_order);

    let mut grouped = GroupedRoadmap::default();
    for item in &items {
        let bucket = match item.status {
            RoadmapStatus::Planned => &mut grouped.planned,
            RoadmapStatus::InProgress => &mut grouped.in_progress,
            RoadmapStatus::Completed => &mut grouped.completed,
            RoadmapStatus::Archived => continue,
        };
        bucket.push(item.clone());
    }

    PublicRoadmap { items, grouped }
}

/// Seed file: phases in display order, each with its items
#[derive(Debug, Clone, Deserialize)]
pub struct RoadmapSeed {
    pub phases: Vec<SeedPhase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPhase {
    pub phase: String,
    pub items: Vec<SeedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

const SEED_START_PRIORITY: i32 = 1000;

/// Status and category for a seed phase name
pub fn phase_mapping(phase: &str) -> Option<(RoadmapStatus, &'static str)> {
    match phase {
        "shipped" => Some((RoadmapStatus::Completed, "Core Features")),
        "infrastructure" => Some((RoadmapStatus::Completed, "Infrastructure")),
        "building-now" => Some((RoadmapStatus::InProgress, "In Development")),
        "up-next" => Some((RoadmapStatus::Planned, "Planned")),
        "exploring" => Some((RoadmapStatus::Planned, "Future Ideas")),
        _ => None,
    }
}

impl RoadmapSeed {
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Items in file order with priority counting down from 1000.
    /// Unknown phases are reported back rather than guessed at.
    pub fn into_items(self) -> Result<Vec<NewRoadmapItem>, String> {
        let mut priority = SEED_START_PRIORITY;
        let mut items = Vec::new();

        for section in self.phases {
            let (status, category) = phase_mapping(&section.phase)
                .ok_or_else(|| format!("unknown roadmap phase '{}'", section.phase))?;

            for item in section.items {
                items.push(NewRoadmapItem {
                    title: item.title,
                    description: item.description,
                    status,
                    category: Some(category.to_string()),
                    priority,
                    target_date: None,
                    created_by: Some("system".to_string()),
                });
                priority -= 1;
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(title: &str, status: RoadmapStatus, votes: i32, priority: i32) -> RoadmapItem {
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
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn public_roadmap_hides_archived_and_sorts() {
        let roadmap = public_roadmap(vec![
            item("B", RoadmapStatus::Planned, 1, 5),
            item("A", RoadmapStatus::Planned, 1, 5),
            item("Top", RoadmapStatus::Planned, 9, 0),
            item("Old", RoadmapStatus::Archived, 100, 0),
            item("Doing", RoadmapStatus::InProgress, 0, 0),
        ]);

        let titles: Vec<&str> = roadmap.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Top", "A", "B", "Doing"]);
        assert_eq!(roadmap.grouped.planned.len(), 3);
        assert_eq!(roadmap.grouped.in_progress.len(), 1);
        assert!(roadmap.grouped.completed.is_empty());
    }

    #[test]
    fn seed_assigns_descending_priority() {
        let seed = RoadmapSeed::from_yaml(
            r#"
phases:
  - phase: shipped
    items:
      - title: One
      - title: Two
        description: second
  - phase: exploring
    items:
      - title: Three
"#,
        )
        .unwrap();
        let items = seed.into_items().unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].priority, 1000);
        assert_eq!(items[2].priority, 998);
        assert_eq!(items[0].status, RoadmapStatus::Completed);
        assert_eq!(items[2].category.as_deref(), Some("Future Ideas"));
        assert_eq!(items[1].created_by.as_deref(), Some("system"));
    }

    #[test]
    fn shipped_seed_file_parses() {
        let seed = RoadmapSeed::from_yaml(include_str!("../../seeds/roadmap.yaml")).unwrap();
        assert!(!seed.into_items().unwrap().is_empty());
    }

    #[test]
    fn unknown_phase_is_rejected() {
        let seed = RoadmapSeed::from_yaml("phases:\n  - phase: someday\n    items: []\n").unwrap();
        assert!(seed.into_items().is_err());
    }
}
