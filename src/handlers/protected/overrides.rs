use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::ApiJson;
use crate::database::models::{AvailabilityOverride, NewOverride, OverrideKind, OverrideUpdate};
use crate::error::ApiError;
use crate::middleware::CurrentTenant;
use crate::services::validation::{parse_date, validate_time_range};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRequest {
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default, with = "crate::database::models::plan::double_option")]
    pub reason: Option<Option<String>>,
}

fn parse_kind(value: &str) -> Result<OverrideKind, ApiError> {
    OverrideKind::try_from(value.to_string())
        .map_err(|_| ApiError::validation("Type must be 'closed' or 'custom'"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn override_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found("Override not found"))
}

/// GET /api/availability/overrides - Tenant's overrides by date
pub async fn overrides_list(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
) -> Result<Json<Vec<AvailabilityOverride>>, ApiError> {
    Ok(Json(state.store.overrides.list(tenant.id).await?))
}

/// POST /api/availability/overrides - Close a date or give it custom hours
///
/// One override per date per tenant; a second one for the same date is 409.
pub async fn override_create(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    ApiJson(body): ApiJson<OverrideRequest>,
) -> Result<(StatusCode, Json<AvailabilityOverride>), ApiError> {
    let (Some(date), Some(kind)) = (non_empty(body.date), non_empty(body.kind)) else {
        return Err(ApiError::validation("Date and type are required"));
    };
    let kind = parse_kind(&kind)?;
    let date = parse_date(&date)?;

    let (start_time, end_time) = match kind {
        OverrideKind::Custom => {
            let start = non_empty(body.start_time);
            let end = non_empty(body.end_time);
            validate_time_range(start.as_deref(), end.as_deref())?;
            (start, end)
        }
        OverrideKind::Closed => (None, None),
    };

    let created = state
        .store
        .overrides
        .create(NewOverride {
            tenant_id: tenant.id,
            date,
            kind,
            start_time,
            end_time,
            reason: body.reason.flatten().filter(|r| !r.trim().is_empty()),
        })
        .await?;

    tracing::info!(tenant_id = %tenant.id, date = %created.date, kind = created.kind.as_str(), "Availability override created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/availability/overrides/:id - Change type, hours or reason
///
/// Absent times fall back to the stored ones; switching to `closed` clears
/// them. The date itself cannot change.
pub async fn override_update(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<OverrideRequest>,
) -> Result<Json<AvailabilityOverride>, ApiError> {
    let id = override_id(&id)?;

    let existing = state
        .store
        .overrides
        .find(tenant.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Override not found"))?;

    let kind = match non_empty(body.kind) {
        Some(kind) => parse_kind(&kind)?,
        None => existing.kind,
    };

    let (start_time, end_time) = match kind {
        OverrideKind::Custom => {
            let start = non_empty(body.start_time).or(existing.start_time);
            let end = non_empty(body.end_time).or(existing.end_time);
            validate_time_range(start.as_deref(), end.as_deref())?;
            (start, end)
        }
        OverrideKind::Closed => (None, None),
    };

    let reason = match body.reason {
        Some(reason) => reason.filter(|r| !r.trim().is_empty()),
        None => existing.reason,
    };

    let updated = state
        .store
        .overrides
        .update(
            tenant.id,
            id,
            OverrideUpdate {
                kind,
                start_time,
                end_time,
                reason,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Override not found"))?;

    Ok(Json(updated))
}

/// DELETE /api/availability/overrides/:id - Remove one of the tenant's overrides
///
/// A single statement filtered on both ids; another tenant's override is 404.
pub async fn override_delete(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = override_id(&id)?;

    if !state.store.overrides.delete(tenant.id, id).await? {
        return Err(ApiError::not_found("Override not found"));
    }

    tracing::info!(tenant_id = %tenant.id, override_id = %id, "Availability override deleted");

    Ok(Json(json!({ "success": true })))
}
