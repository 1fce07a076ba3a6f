use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::ApiJson;
use crate::database::models::{plan_slug, NewPlan, PlanChanges};
use crate::database::repository::DEFAULT_PLAN_REQUIRED;
use crate::error::ApiError;
use crate::integrations::CatalogEntry;
use crate::services::validation::parse_uuid;
use crate::state::AppState;

/// GET /api/plans/debug - Every plan with internal fields and counters
pub async fn plans_debug(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let plans = state.store.plans.list_all().await?;
    let active = plans.iter().filter(|p| p.active).count();

    Ok(Json(json!({
        "total": plans.len(),
        "active": active,
        "inactive": plans.len() - active,
        "plans": plans,
    })))
}

/// GET /api/admin/plans - Every plan by sort order
pub async fn plans_list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let plans = state.store.plans.list_all().await?;
    Ok(Json(json!({ "plans": plans })))
}

#[derive(Debug, Deserialize)]
pub struct PlanUpdateRequest {
    pub id: Option<String>,
    #[serde(flatten)]
    pub changes: PlanChanges,
}

fn check_limits(limits: [Option<i32>; 3]) -> Result<(), ApiError> {
    if limits.into_iter().flatten().any(|l| l < 0) {
        return Err(ApiError::validation("Limits must be zero or greater"));
    }
    Ok(())
}

fn validate_changes(changes: &PlanChanges) -> Result<(), ApiError> {
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("Name cannot be empty"));
    }

    check_limits([
        changes.max_contacts.flatten(),
        changes.max_bookings.flatten(),
        changes.max_services.flatten(),
    ])
}

fn required_plan_id(raw: Option<&str>) -> Result<Uuid, ApiError> {
    let id = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("Plan ID is required"))?;
    parse_uuid(id, "id")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanCreateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub price_monthly: Option<i32>,
    pub price_yearly: Option<i32>,
    pub max_contacts: Option<i32>,
    pub max_bookings: Option<i32>,
    pub max_services: Option<i32>,
    #[serde(default)]
    pub is_default: bool,
}

/// POST /api/admin/plans - Create a plan and the product it is sold under
///
/// The product and prices are created with the payment processor first; the
/// plan is appended after the last one in sort order.
pub async fn plan_create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PlanCreateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    let price_monthly = body.price_monthly.filter(|p| *p > 0);
    let Some(price_monthly) = price_monthly.filter(|_| !name.is_empty()) else {
        return Err(ApiError::validation("Name and monthly price are required"));
    };
    check_limits([body.max_contacts, body.max_bookings, body.max_services])?;

    let slug = plan_slug(name);
    if slug.is_empty() {
        return Err(ApiError::validation("Name must contain letters or numbers"));
    }
    if state.store.plans.find_by_slug(&slug).await?.is_some() {
        return Err(ApiError::conflict("A plan with this name already exists"));
    }

    let description = body
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let price_yearly = body.price_yearly.filter(|p| *p > 0);

    let prices = state
        .payments
        .create_catalog_entry(&CatalogEntry {
            name: name.to_string(),
            description: description.clone(),
            slug: slug.clone(),
            price_monthly,
            price_yearly,
        })
        .await?;

    let plan = state
        .store
        .plans
        .create(NewPlan {
            name: name.to_string(),
            slug,
            description,
            features: body.features,
            price_monthly,
            price_yearly,
            stripe_product_id: Some(prices.product_id),
            stripe_price_id: Some(prices.monthly_price_id),
            stripe_price_id_yearly: prices.yearly_price_id,
            max_contacts: body.max_contacts,
            max_bookings: body.max_bookings,
            max_services: body.max_services,
            is_default: body.is_default,
        })
        .await?;

    tracing::info!(plan_id = %plan.id, slug = %plan.slug, is_default = plan.is_default, "Plan created");

    Ok((StatusCode::CREATED, Json(json!({ "plan": plan }))))
}

#[derive(Debug, Deserialize)]
pub struct PlanIdQuery {
    pub id: Option<String>,
}

/// DELETE /api/admin/plans?id= - Remove a plan, or archive it while tenants
/// are still subscribed
///
/// The default plan is never removed.
pub async fn plan_delete(
    State(state): State<AppState>,
    Query(query): Query<PlanIdQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = required_plan_id(query.id.as_deref())?;

    let plan = state
        .store
        .plans
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Plan not found"))?;
    if plan.is_default {
        return Err(ApiError::validation(DEFAULT_PLAN_REQUIRED));
    }

    let subscribers = state.store.plans.tenant_count(id).await?;
    if subscribers > 0 {
        if let Some(product_id) = &plan.stripe_product_id {
            state.payments.archive_product(product_id, &[]).await?;
        }
        let archived = state
            .store
            .plans
            .update(
                id,
                &PlanChanges {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| ApiError::not_found("Plan not found"))?;

        tracing::info!(plan_id = %id, subscribers, "Plan archived");

        return Ok(Json(json!({
            "plan": archived,
            "message": format!(
                "Plan archived. {} tenant(s) are still using this plan.",
                subscribers
            ),
        })));
    }

    if let Some(product_id) = &plan.stripe_product_id {
        let prices: Vec<String> = [&plan.stripe_price_id, &plan.stripe_price_id_yearly]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        state.payments.archive_product(product_id, &prices).await?;
    }

    if !state.store.plans.delete(id).await? {
        return Err(ApiError::not_found("Plan not found"));
    }

    tracing::info!(plan_id = %id, "Plan deleted");

    Ok(Json(json!({ "success": true })))
}

/// PATCH /api/admin/plans - Update a plan's display fields, limits and flags
///
/// Body is `{ "id": ..., ...changes }`. Marking a plan default clears the
/// flag on every other plan in the same transaction; the current default
/// keeps its flag until another plan takes it.
pub async fn plan_update(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PlanUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = required_plan_id(body.id.as_deref())?;
    validate_changes(&body.changes)?;

    let current = state
        .store
        .plans
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Plan not found"))?;
    if current.is_default && body.changes.is_default == Some(false) {
        return Err(ApiError::validation(DEFAULT_PLAN_REQUIRED));
    }

    let plan = state
        .store
        .plans
        .update(id, &body.changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Plan not found"))?;

    tracing::info!(plan_id = %plan.id, is_default = plan.is_default, active = plan.active, "Plan updated");

    Ok(Json(json!({ "plan": plan })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub plan_ids: Option<Vec<String>>,
}

/// Non-empty, every entry a UUID, no repeats
fn parse_plan_ids(raw: Option<Vec<String>>) -> Result<Vec<Uuid>, ApiError> {
    let raw = raw
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| ApiError::validation("planIds must be a non-empty array"))?;

    let mut seen = HashSet::with_capacity(raw.len());
    let mut ids = Vec::with_capacity(raw.len());
    for value in &raw {
        let id = parse_uuid(value.trim(), "plan id")?;
        if !seen.insert(id) {
            return Err(ApiError::validation("planIds must not contain duplicates"));
        }
        ids.push(id);
    }

    Ok(ids)
}

/// POST /api/admin/plans/reorder - Persist a new plan order
///
/// `{ "planIds": [...] }`; each id's index becomes its sort order. All or
/// nothing: any failure leaves the previous order intact.
pub async fn plans_reorder(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> Result<Json<Value>, ApiError> {
    let ids = parse_plan_ids(body.plan_ids)?;

    let plans = state
        .store
        .plans
        .reorder(&ids)
        .await
        .map_err(|e| ApiError::internal("Failed to reorder plans", e))?;

    tracing::info!(count = ids.len(), "Plans reordered");

    Ok(Json(json!({ "plans": plans })))
}
