use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::ApiJson;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckEmailRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
}

fn invalid_email() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "available": false, "error": "Invalid email format" })),
    )
        .into_response()
}

/// POST /api/signup/check-email - Whether an email can still sign up
///
/// Malformed input answers 400 with `available: false` so the signup form
/// can render it like any other unavailable address.
pub async fn check_email(
    State(state): State<AppState>,
    body: Result<ApiJson<CheckEmailRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let Ok(ApiJson(mut body)) = body else {
        return Ok(invalid_email());
    };

    body.email = body.email.trim().to_lowercase();
    if body.validate().is_err() {
        return Ok(invalid_email());
    }

    let registered = state.identity.email_registered(&body.email).await?;

    let response = if registered {
        json!({
            "available": false,
            "message": "An account with this email already exists. Please sign in instead.",
        })
    } else {
        json!({
            "available": true,
            "message": "Email is available",
        })
    };

    Ok(Json(response).into_response())
}
