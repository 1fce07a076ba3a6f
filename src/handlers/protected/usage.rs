use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::error::ApiError;
use crate::middleware::CurrentTenant;
use crate::services::usage::{month_start, plan_usage, PlanUsage};
use crate::state::AppState;

/// GET /api/plan/usage - Tenant's plan limits against current usage
///
/// Bookings count from the start of the current calendar month (UTC).
pub async fn usage_get(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
) -> Result<Json<PlanUsage>, ApiError> {
    let plan = match tenant.plan_id {
        Some(plan_id) => state.store.plans.find(plan_id).await?,
        None => None,
    };

    let counts = state
        .store
        .tenants
        .usage_counts(tenant.id, month_start(Utc::now()))
        .await?;

    Ok(Json(plan_usage(plan.as_ref(), counts)))
}
