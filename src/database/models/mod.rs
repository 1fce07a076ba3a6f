pub mod availability_override;
pub mod plan;
pub mod roadmap_item;
pub mod service;
pub mod tenant;

pub use availability_override::{AvailabilityOverride, NewOverride, OverrideKind, OverrideUpdate};
pub use plan::{plan_slug, NewPlan, Plan, PlanChanges, PublicPlan};
pub use roadmap_item::{NewRoadmapItem, RoadmapChanges, RoadmapItem, RoadmapStatus};
pub use service::{NewService, PublicService, Service, ServiceChanges};
pub use tenant::Tenant;
