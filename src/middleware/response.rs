use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::error::ErrorReport;
use crate::state::AppState;

/// Adds internal error detail to 5xx bodies when configured; otherwise
/// responses pass through untouched
pub async fn error_detail_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if !state.config.server.expose_error_detail {
        return response;
    }

    let Some(ErrorReport {
        message,
        detail: Some(detail),
    }) = response.extensions().get::<ErrorReport>().cloned()
    else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    let body = Json(json!({ "error": message, "detail": detail }));
    (parts, body).into_response()
}
