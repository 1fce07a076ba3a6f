use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::auth::AdminCredentials;
use crate::database::models::{NewRoadmapItem, RoadmapChanges, RoadmapStatus};
use crate::error::ApiError;
use crate::services::validation::{parse_date, parse_uuid};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Body for create and patch. Nullable fields distinguish absent from null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapItemRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default, with = "crate::database::models::plan::double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(default, with = "crate::database::models::plan::double_option")]
    pub category: Option<Option<String>>,
    pub priority: Option<i32>,
    #[serde(default, with = "crate::database::models::plan::double_option")]
    pub target_date: Option<Option<String>>,
}

fn parse_status(value: &str) -> Result<RoadmapStatus, ApiError> {
    RoadmapStatus::parse(value.trim()).ok_or_else(|| ApiError::validation("Invalid status"))
}

/// RFC 3339 timestamp or a plain `YYYY-MM-DD` (midnight UTC)
fn parse_target_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    parse_date(value)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::validation("Invalid target date"))
}

fn required_id(raw: Option<&str>) -> Result<uuid::Uuid, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("ID required"))?;
    parse_uuid(raw, "id")
}

/// GET /api/admin/content/roadmap?status= - Items by priority with per-status counts
///
/// `status=all` (or no status) lists everything, archived included.
pub async fn items_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(parse_status(raw)?),
    };

    let items = state.store.roadmap.list(status).await?;
    let status_counts: BTreeMap<&'static str, i64> = state
        .store
        .roadmap
        .status_counts()
        .await?
        .into_iter()
        .map(|(status, count)| (status.as_str(), count))
        .collect();

    Ok(Json(json!({ "items": items, "statusCounts": status_counts })))
}

/// POST /api/admin/content/roadmap - Create an item
///
/// Title is required; status defaults to `planned` and priority to 0.
pub async fn item_create(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminCredentials>,
    ApiJson(body): ApiJson<RoadmapItemRequest>,
) -> Result<Json<Value>, ApiError> {
    let title = body
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Title required"))?;

    let status = match body.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => RoadmapStatus::Planned,
    };

    let target_date = match body.target_date.flatten() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_target_date(&raw)?),
        _ => None,
    };

    let item = state
        .store
        .roadmap
        .create(NewRoadmapItem {
            title,
            description: body.description.flatten(),
            status,
            category: body.category.flatten(),
            priority: body.priority.unwrap_or(0),
            target_date,
            created_by: admin.user_id,
        })
        .await?;

    tracing::info!(item_id = %item.id, status = item.status.as_str(), "Roadmap item created");

    Ok(Json(json!({ "item": item })))
}

/// PATCH /api/admin/content/roadmap - Update an item's editable fields
///
/// Body is `{ "id": ..., ...fields }`. Votes cannot be edited here; moving
/// to `completed` stamps the completion time.
pub async fn item_update(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RoadmapItemRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = required_id(body.id.as_deref())?;

    let title = match body.title {
        Some(title) if title.trim().is_empty() => {
            return Err(ApiError::validation("Title required"))
        }
        Some(title) => Some(title.trim().to_string()),
        None => None,
    };

    let target_date = match body.target_date {
        Some(Some(raw)) if !raw.trim().is_empty() => Some(Some(parse_target_date(&raw)?)),
        Some(_) => Some(None),
        None => None,
    };

    let changes = RoadmapChanges {
        title,
        description: body.description,
        status: body.status.as_deref().map(parse_status).transpose()?,
        category: body.category,
        priority: body.priority,
        target_date,
    };

    let item = state
        .store
        .roadmap
        .update(id, &changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Roadmap item not found"))?;

    Ok(Json(json!({ "item": item })))
}

/// DELETE /api/admin/content/roadmap?id= - Remove an item
pub async fn item_delete(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = required_id(query.id.as_deref())?;

    if !state.store.roadmap.delete(id).await? {
        return Err(ApiError::not_found("Roadmap item not found"));
    }

    tracing::info!(item_id = %id, "Roadmap item deleted");

    Ok(Json(json!({ "success": true })))
}
