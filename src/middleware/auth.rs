use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Verifies the identity provider session and injects `Session`.
/// Rejects with 401 before any database access.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = state.sessions.verify_headers(request.headers())?;

    tracing::debug!(user_id = %session.user_id, org_id = ?session.org_id, "Session verified");

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
