//! In-memory repositories for tests and `--memory` local runs.
//!
//! All state sits behind one mutex so multi-row operations (reorder, default
//! plan switch) stay all-or-nothing the same way the Postgres transactions do.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    AvailabilityOverride, NewOverride, NewPlan, NewRoadmapItem, NewService, OverrideUpdate, Plan,
    PlanChanges, RoadmapChanges, RoadmapItem, RoadmapStatus, Service, ServiceChanges, Tenant,
};
use crate::database::repository::{
    DbResult, HealthCheck, OverrideRepository, PlanRepository, RoadmapRepository, ServiceRepository,
    TenantRepository, UsageCounts, DEFAULT_PLAN_REQUIRED,
};

#[derive(Default)]
struct MemoryState {
    tenants: HashMap<Uuid, Tenant>,
    plans: HashMap<Uuid, Plan>,
    services: HashMap<Uuid, Service>,
    overrides: HashMap<Uuid, AvailabilityOverride>,
    roadmap: HashMap<Uuid, RoadmapItem>,
    /// tenant id per contact
    contacts: Vec<Uuid>,
    /// (tenant id, created at) per booking
    bookings: Vec<(Uuid, DateTime<Utc>)>,
}

#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    healthy: Arc<AtomicBool>,
    accesses: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            healthy: Arc::new(AtomicBool::new(true)),
            accesses: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.state().tenants.insert(tenant.id, tenant);
    }

    pub fn insert_plan(&self, plan: Plan) {
        self.state().plans.insert(plan.id, plan);
    }

    pub fn insert_service(&self, service: Service) {
        self.state().services.insert(service.id, service);
    }

    pub fn insert_roadmap_item(&self, item: RoadmapItem) {
        self.state().roadmap.insert(item.id, item);
    }

    pub fn insert_contact(&self, tenant_id: Uuid) {
        self.state().contacts.push(tenant_id);
    }

    pub fn insert_booking(&self, tenant_id: Uuid, created_at: DateTime<Utc>) {
        self.state().bookings.push((tenant_id, created_at));
    }

    pub fn tenant(&self, id: Uuid) -> Option<Tenant> {
        self.state().tenants.get(&id).cloned()
    }

    /// Number of times the state has been read or written
    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Make `ping` fail, for exercising the unhealthy path
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

fn sorted_plans<'a>(plans: impl Iterator<Item = &'a Plan>) -> Vec<Plan> {
    let mut plans: Vec<Plan> = plans.cloned().collect();
    plans.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then(a.created_at.cmp(&b.created_at))
    });
    plans
}

#[async_trait]
impl TenantRepository for MemoryStore {
    async fn find_by_org_id(&self, org_id: &str) -> DbResult<Option<Tenant>> {
        Ok(self
            .state()
            .tenants
            .values()
            .find(|t| t.org_id == org_id)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<Tenant>> {
        Ok(self
            .state()
            .tenants
            .values()
            .find(|t| t.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn clear_connected_account(&self, tenant_id: Uuid) -> DbResult<()> {
        let mut state = self.state();
        if let Some(tenant) = state.tenants.get_mut(&tenant_id) {
            tenant.stripe_account_id = None;
            if let Some(entries) = tenant.integrations.as_object_mut() {
                entries.remove("stripe");
            }
            tenant.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn usage_counts(&self, tenant_id: Uuid, period_start: DateTime<Utc>) -> DbResult<UsageCounts> {
        let state = self.state();
        let count = |n: usize| n as i64;
        Ok(UsageCounts {
            contacts: count(state.contacts.iter().filter(|id| **id == tenant_id).count()),
            services: count(
                state
                    .services
                    .values()
                    .filter(|s| s.tenant_id == tenant_id)
                    .count(),
            ),
            bookings_this_period: count(
                state
                    .bookings
                    .iter()
                    .filter(|(id, at)| *id == tenant_id && *at >= period_start)
                    .count(),
            ),
        })
    }
}

#[async_trait]
impl PlanRepository for MemoryStore {
    async fn list_active(&self) -> DbResult<Vec<Plan>> {
        Ok(sorted_plans(self.state().plans.values().filter(|p| p.active)))
    }

    async fn list_all(&self) -> DbResult<Vec<Plan>> {
        Ok(sorted_plans(self.state().plans.values()))
    }

    async fn find(&self, id: Uuid) -> DbResult<Option<Plan>> {
        Ok(self.state().plans.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<Plan>> {
        Ok(self.state().plans.values().find(|p| p.slug == slug).cloned())
    }

    async fn create(&self, input: NewPlan) -> DbResult<Plan> {
        let mut state = self.state();

        if state.plans.values().any(|p| p.slug == input.slug) {
            return Err(DatabaseError::Conflict(
                "A plan with this name already exists".to_string(),
            ));
        }

        let now = Utc::now();
        if input.is_default {
            for plan in state.plans.values_mut().filter(|p| p.is_default) {
                plan.is_default = false;
                plan.updated_at = now;
            }
        }

        let sort_order = state
            .plans
            .values()
            .map(|p| p.sort_order + 1)
            .max()
            .unwrap_or(0);

        let plan = Plan {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            description: input.description,
            features: Json(input.features),
            price_monthly: input.price_monthly,
            price_yearly: input.price_yearly,
            stripe_product_id: input.stripe_product_id,
            stripe_price_id: input.stripe_price_id,
            stripe_price_id_yearly: input.stripe_price_id_yearly,
            max_contacts: input.max_contacts,
            max_bookings: input.max_bookings,
            max_services: input.max_services,
            sort_order,
            active: true,
            is_default: input.is_default,
            created_at: now,
            updated_at: now,
        };
        state.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn reorder(&self, ordered_ids: &[Uuid]) -> DbResult<Vec<Plan>> {
        let mut state = self.state();

        if let Some(missing) = ordered_ids.iter().find(|id| !state.plans.contains_key(id)) {
            return Err(DatabaseError::NotFound(format!("plan {}", missing)));
        }

        let now = Utc::now();
        for (position, id) in ordered_ids.iter().enumerate() {
            if let Some(plan) = state.plans.get_mut(id) {
                plan.sort_order = position as i32;
                plan.updated_at = now;
            }
        }

        Ok(sorted_plans(state.plans.values()))
    }

    async fn update(&self, id: Uuid, changes: &PlanChanges) -> DbResult<Option<Plan>> {
        let mut state = self.state();

        let Some(current) = state.plans.get(&id) else {
            return Ok(None);
        };
        if current.is_default && changes.is_default == Some(false) {
            return Err(DatabaseError::Conflict(DEFAULT_PLAN_REQUIRED.to_string()));
        }

        let now = Utc::now();
        if changes.is_default == Some(true) {
            for plan in state.plans.values_mut().filter(|p| p.id != id && p.is_default) {
                plan.is_default = false;
                plan.updated_at = now;
            }
        }

        Ok(state.plans.get_mut(&id).map(|plan| {
            changes.apply(plan);
            plan.updated_at = now;
            plan.clone()
        }))
    }

    async fn tenant_count(&self, id: Uuid) -> DbResult<i64> {
        let state = self.state();
        Ok(state.tenants.values().filter(|t| t.plan_id == Some(id)).count() as i64)
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        Ok(self.state().plans.remove(&id).is_some())
    }
}

#[async_trait]
impl ServiceRepository for MemoryStore {
    async fn list_active(&self, tenant_id: Uuid) -> DbResult<Vec<Service>> {
        let mut services: Vec<Service> = self
            .state()
            .services
            .values()
            .filter(|s| s.tenant_id == tenant_id && s.active)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    async fn find_active(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<Service>> {
        Ok(self
            .state()
            .services
            .get(&id)
            .filter(|s| s.tenant_id == tenant_id && s.active)
            .cloned())
    }

    async fn list(&self, tenant_id: Uuid) -> DbResult<Vec<Service>> {
        let mut services: Vec<Service> = self
            .state()
            .services
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(services)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<Service>> {
        Ok(self
            .state()
            .services
            .get(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .cloned())
    }

    async fn create(&self, input: NewService) -> DbResult<Service> {
        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            name: input.name,
            description: input.description,
            duration: input.duration,
            price: input.price,
            active: input.active,
            created_at: now,
            updated_at: now,
        };
        self.state().services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: &ServiceChanges,
    ) -> DbResult<Option<Service>> {
        let mut state = self.state();
        Ok(state
            .services
            .get_mut(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .map(|service| {
                changes.apply(service);
                service.updated_at = Utc::now();
                service.clone()
            }))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool> {
        let mut state = self.state();
        let owned = state
            .services
            .get(&id)
            .is_some_and(|s| s.tenant_id == tenant_id);
        if owned {
            state.services.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl OverrideRepository for MemoryStore {
    async fn list(&self, tenant_id: Uuid) -> DbResult<Vec<AvailabilityOverride>> {
        let mut overrides: Vec<AvailabilityOverride> = self
            .state()
            .overrides
            .values()
            .filter(|o| o.tenant_id == tenant_id)
            .cloned()
            .collect();
        overrides.sort_by_key(|o| o.date);
        Ok(overrides)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<AvailabilityOverride>> {
        Ok(self
            .state()
            .overrides
            .get(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .cloned())
    }

    async fn create(&self, input: NewOverride) -> DbResult<AvailabilityOverride> {
        let mut state = self.state();

        let taken = state
            .overrides
            .values()
            .any(|o| o.tenant_id == input.tenant_id && o.date == input.date);
        if taken {
            return Err(DatabaseError::Conflict(
                "An override already exists for this date".to_string(),
            ));
        }

        let now = Utc::now();
        let created = AvailabilityOverride {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            date: input.date,
            kind: input.kind,
            start_time: input.start_time,
            end_time: input.end_time,
            reason: input.reason,
            created_at: now,
            updated_at: now,
        };
        state.overrides.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: OverrideUpdate,
    ) -> DbResult<Option<AvailabilityOverride>> {
        let mut state = self.state();
        Ok(state
            .overrides
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .map(|existing| {
                existing.kind = update.kind;
                existing.start_time = update.start_time;
                existing.end_time = update.end_time;
                existing.reason = update.reason;
                existing.updated_at = Utc::now();
                existing.clone()
            }))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool> {
        let mut state = self.state();
        let owned = state
            .overrides
            .get(&id)
            .is_some_and(|o| o.tenant_id == tenant_id);
        if owned {
            state.overrides.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl RoadmapRepository for MemoryStore {
    async fn list(&self, status: Option<RoadmapStatus>) -> DbResult<Vec<RoadmapItem>> {
        let mut items: Vec<RoadmapItem> = self
            .state()
            .roadmap
            .values()
            .filter(|item| status.map_or(true, |s| item.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(items)
    }

    async fn status_counts(&self) -> DbResult<Vec<(RoadmapStatus, i64)>> {
        let state = self.state();
        let mut counts: HashMap<RoadmapStatus, i64> = HashMap::new();
        for item in state.roadmap.values() {
            *counts.entry(item.status).or_default() += 1;
        }
        let mut counts: Vec<(RoadmapStatus, i64)> = counts.into_iter().collect();
        counts.sort();
        Ok(counts)
    }

    async fn create(&self, input: NewRoadmapItem) -> DbResult<RoadmapItem> {
        let now = Utc::now();
        let item = RoadmapItem {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            completed_at: (input.status == RoadmapStatus::Completed).then_some(now),
            status: input.status,
            category: input.category,
            votes: 0,
            priority: input.priority,
            target_date: input.target_date,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state().roadmap.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, id: Uuid, changes: &RoadmapChanges) -> DbResult<Option<RoadmapItem>> {
        let mut state = self.state();
        Ok(state.roadmap.get_mut(&id).map(|item| {
            changes.apply(item, Utc::now());
            item.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        Ok(self.state().roadmap.remove(&id).is_some())
    }

    async fn clear(&self) -> DbResult<u64> {
        let mut state = self.state();
        let removed = state.roadmap.len() as u64;
        state.roadmap.clear();
        Ok(removed)
    }

    async fn increment_votes(&self, id: Uuid) -> DbResult<Option<RoadmapItem>> {
        let mut state = self.state();
        Ok(state.roadmap.get_mut(&id).map(|item| {
            item.votes += 1;
            item.clone()
        }))
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> DbResult<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DatabaseError::QueryError("store marked unhealthy".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name: &str, sort_order: i32, is_default: bool) -> Plan {
        let now = Utc::now();
        Plan {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: None,
            features: Json(vec![]),
            price_monthly: 0,
            price_yearly: None,
            stripe_product_id: None,
            stripe_price_id: None,
            stripe_price_id_yearly: None,
            max_contacts: None,
            max_bookings: None,
            max_services: None,
            sort_order,
            active: true,
            is_default,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn reorder_with_unknown_id_changes_nothing() {
        let store = MemoryStore::new();
        let a = plan("Free", 0, true);
        let b = plan("Pro", 1, false);
        store.insert_plan(a.clone());
        store.insert_plan(b.clone());

        let result = PlanRepository::reorder(&store, &[b.id, Uuid::new_v4(), a.id]).await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));

        let plans = store.list_all().await.unwrap();
        assert_eq!(plans[0].id, a.id);
        assert_eq!(plans[1].id, b.id);
    }

    #[tokio::test]
    async fn default_switch_leaves_one_default() {
        let store = MemoryStore::new();
        let a = plan("Free", 0, true);
        let b = plan("Pro", 1, false);
        store.insert_plan(a.clone());
        store.insert_plan(b.clone());

        let changes = PlanChanges {
            is_default: Some(true),
            ..Default::default()
        };
        PlanRepository::update(&store, b.id, &changes).await.unwrap();

        let defaults: Vec<Uuid> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_default)
            .map(|p| p.id)
            .collect();
        assert_eq!(defaults, vec![b.id]);
    }

    #[tokio::test]
    async fn current_default_cannot_be_unset() {
        let store = MemoryStore::new();
        let a = plan("Free", 0, true);
        store.insert_plan(a.clone());

        let changes = PlanChanges {
            is_default: Some(false),
            ..Default::default()
        };
        let result = PlanRepository::update(&store, a.id, &changes).await;
        assert!(matches!(result, Err(DatabaseError::Conflict(_))));
        assert!(PlanRepository::find(&store, a.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn created_plan_goes_last_and_takes_default() {
        let store = MemoryStore::new();
        store.insert_plan(plan("Free", 0, true));
        store.insert_plan(plan("Pro", 4, false));

        let input = NewPlan {
            name: "Team".to_string(),
            slug: "team".to_string(),
            description: None,
            features: vec!["Shared inbox".to_string()],
            price_monthly: 9900,
            price_yearly: None,
            stripe_product_id: None,
            stripe_price_id: None,
            stripe_price_id_yearly: None,
            max_contacts: None,
            max_bookings: None,
            max_services: None,
            is_default: true,
        };
        let created = PlanRepository::create(&store, input.clone()).await.unwrap();
        assert_eq!(created.sort_order, 5);

        let defaults = store.list_all().await.unwrap().into_iter().filter(|p| p.is_default).count();
        assert_eq!(defaults, 1);

        let again = PlanRepository::create(&store, input).await;
        assert!(matches!(again, Err(DatabaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn override_delete_requires_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let created = OverrideRepository::create(
            &store,
            NewOverride {
                tenant_id: owner,
                date: chrono::NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(),
                kind: crate::database::models::OverrideKind::Closed,
                start_time: None,
                end_time: None,
                reason: None,
            },
        )
        .await
        .unwrap();

        assert!(!OverrideRepository::delete(&store, Uuid::new_v4(), created.id).await.unwrap());
        assert!(OverrideRepository::delete(&store, owner, created.id).await.unwrap());
    }
}
