//! Repository traits for data access.
//!
//! Tenant-owned repositories take the resolved tenant id on every call and
//! filter on it together with the resource id, so a lookup can never match a
//! row belonging to another tenant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    AvailabilityOverride, NewOverride, NewPlan, NewRoadmapItem, NewService, OverrideUpdate, Plan,
    PlanChanges, RoadmapChanges, RoadmapItem, RoadmapStatus, Service, ServiceChanges, Tenant,
};

pub type DbResult<T> = Result<T, DatabaseError>;

/// Refusal to leave the catalogue without a default plan
pub const DEFAULT_PLAN_REQUIRED: &str = "Another plan must be made default first";

/// Resource counts used for plan limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounts {
    pub contacts: i64,
    pub services: i64,
    pub bookings_this_period: i64,
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_org_id(&self, org_id: &str) -> DbResult<Option<Tenant>>;
    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<Tenant>>;
    async fn clear_connected_account(&self, tenant_id: Uuid) -> DbResult<()>;
    async fn usage_counts(&self, tenant_id: Uuid, period_start: DateTime<Utc>) -> DbResult<UsageCounts>;
}

#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Active plans ordered by sort order
    async fn list_active(&self) -> DbResult<Vec<Plan>>;
    /// Every plan ordered by sort order
    async fn list_all(&self) -> DbResult<Vec<Plan>>;
    async fn find(&self, id: Uuid) -> DbResult<Option<Plan>>;
    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<Plan>>;
    /// Insert after the last plan. A default plan clears every other default
    /// in the same transaction; a taken slug is `DatabaseError::Conflict`.
    async fn create(&self, input: NewPlan) -> DbResult<Plan>;
    /// Set `sort_order` to each id's position, all or nothing
    async fn reorder(&self, ordered_ids: &[Uuid]) -> DbResult<Vec<Plan>>;
    /// Apply changes; marking a plan default clears every other default in
    /// the same transaction. Unsetting the flag on the current default is
    /// `DatabaseError::Conflict`.
    async fn update(&self, id: Uuid, changes: &PlanChanges) -> DbResult<Option<Plan>>;
    /// Tenants subscribed to the plan
    async fn tenant_count(&self, id: Uuid) -> DbResult<i64>;
    async fn delete(&self, id: Uuid) -> DbResult<bool>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn list_active(&self, tenant_id: Uuid) -> DbResult<Vec<Service>>;
    async fn find_active(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<Service>>;
    /// Every service of the tenant, active or not
    async fn list(&self, tenant_id: Uuid) -> DbResult<Vec<Service>>;
    async fn find(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<Service>>;
    async fn create(&self, input: NewService) -> DbResult<Service>;
    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: &ServiceChanges,
    ) -> DbResult<Option<Service>>;
    /// Returns false when nothing matched both ids. A service with bookings
    /// is `DatabaseError::Conflict`.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool>;
}

#[async_trait]
pub trait OverrideRepository: Send + Sync {
    async fn list(&self, tenant_id: Uuid) -> DbResult<Vec<AvailabilityOverride>>;
    async fn find(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<AvailabilityOverride>>;
    /// Fails with `DatabaseError::Conflict` when the date already has an override
    async fn create(&self, input: NewOverride) -> DbResult<AvailabilityOverride>;
    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: OverrideUpdate,
    ) -> DbResult<Option<AvailabilityOverride>>;
    /// Returns false when nothing matched both ids
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool>;
}

#[async_trait]
pub trait RoadmapRepository: Send + Sync {
    async fn list(&self, status: Option<RoadmapStatus>) -> DbResult<Vec<RoadmapItem>>;
    async fn status_counts(&self) -> DbResult<Vec<(RoadmapStatus, i64)>>;
    async fn create(&self, input: NewRoadmapItem) -> DbResult<RoadmapItem>;
    async fn update(&self, id: Uuid, changes: &RoadmapChanges) -> DbResult<Option<RoadmapItem>>;
    async fn delete(&self, id: Uuid) -> DbResult<bool>;
    /// Remove every item, returning how many were deleted
    async fn clear(&self) -> DbResult<u64>;
    /// Single atomic `votes = votes + 1`
    async fn increment_votes(&self, id: Uuid) -> DbResult<Option<RoadmapItem>>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> DbResult<()>;
}

/// Bundle of repositories handed to the handlers
#[derive(Clone)]
pub struct Store {
    pub tenants: Arc<dyn TenantRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub services: Arc<dyn ServiceRepository>,
    pub overrides: Arc<dyn OverrideRepository>,
    pub roadmap: Arc<dyn RoadmapRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Store {
    /// Wire every repository to one backend implementing all of them
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: TenantRepository
            + PlanRepository
            + ServiceRepository
            + OverrideRepository
            + RoadmapRepository
            + HealthCheck
            + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            tenants: backend.clone(),
            plans: backend.clone(),
            services: backend.clone(),
            overrides: backend.clone(),
            roadmap: backend.clone(),
            health: backend,
        }
    }
}
