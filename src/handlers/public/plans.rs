use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::database::models::PublicPlan;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/plans - Active plans for the pricing page
///
/// Plans are ordered by sort order and projected to the fields safe to show
/// publicly (no payment processor ids or sort order).
pub async fn plans_list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let plans: Vec<PublicPlan> = state
        .store
        .plans
        .list_active()
        .await?
        .into_iter()
        .map(PublicPlan::from)
        .collect();

    Ok(Json(json!({ "plans": plans })))
}
