use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::error::ApiError;
use crate::services::roadmap::public_roadmap;
use crate::services::validation::parse_uuid;
use crate::state::AppState;

/// GET /api/public/roadmap - Non-archived items, flat and grouped by status
pub async fn roadmap_list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let items = state.store.roadmap.list(None).await?;
    Ok(Json(json!(public_roadmap(items))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub item_id: Option<String>,
}

/// POST /api/public/roadmap/vote - Add one vote to an item
///
/// The increment is a single atomic statement. Votes are not deduplicated.
pub async fn roadmap_vote(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let item_id = body
        .item_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("Item ID is required"))?;
    let item_id = parse_uuid(item_id, "itemId")?;

    let item = state
        .store
        .roadmap
        .increment_votes(item_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Roadmap item not found"))?;

    tracing::debug!(item_id = %item.id, votes = item.votes, "Roadmap vote recorded");

    Ok(Json(json!({ "item": item })))
}
