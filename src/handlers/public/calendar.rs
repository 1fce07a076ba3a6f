use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::availability::{booking_window, compute_slots, SlotRules};
use crate::services::validation::parse_date;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub duration: Option<String>,
}

/// No appointment outlasts a day
const MAX_DURATION_MINUTES: i64 = 24 * 60;

fn parse_duration(value: Option<&str>, default: Duration) -> Result<Duration, ApiError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };

    raw.parse::<i64>()
        .ok()
        .filter(|minutes| (1..=MAX_DURATION_MINUTES).contains(minutes))
        .and_then(Duration::try_minutes)
        .ok_or_else(|| {
            ApiError::validation(format!(
                "Duration must be between 1 and {} minutes",
                MAX_DURATION_MINUTES
            ))
        })
}

/// GET /api/calendar/availability?date=YYYY-MM-DD&duration=N - Bookable slots
///
/// Closed days and dates inside the lead time answer an empty list without
/// asking the calendar provider.
pub async fn availability_get(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, ApiError> {
    let date = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::validation("Date is required"))?;
    let date = parse_date(date)?;

    let rules = SlotRules::from_config(&state.config.calendar);
    let duration = parse_duration(query.duration.as_deref(), rules.default_duration)?;
    let now = Utc::now();

    let Some(window) = booking_window(date, &rules, now) else {
        return Ok(Json(json!({ "slots": [] })));
    };

    let busy = state.calendar.busy_intervals(window.open, window.close).await?;
    let slots = compute_slots(window, duration, &busy, &rules, now);

    tracing::debug!(%date, slots = slots.len(), busy = busy.len(), "Computed availability");

    Ok(Json(json!({ "slots": slots })))
}
