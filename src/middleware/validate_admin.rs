use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{cookie_value, extract_token, AdminCredentials};
use crate::error::ApiError;
use crate::state::AppState;

/// Runs the configured admin gate. The response never says which check
/// failed: 401 when nothing was presented, 403 otherwise. Admitted requests
/// carry the `AdminCredentials` they were admitted with.
pub async fn admin_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let security = &state.config.security;
    let headers = request.headers();

    let token_presented = extract_token(headers, &security.session_cookie_name).is_some();
    let credentials = AdminCredentials {
        user_id: state
            .sessions
            .verify_headers(headers)
            .ok()
            .map(|session| session.user_id),
        admin_cookie: cookie_value(headers, &security.admin_cookie_name),
    };

    if state.admin_gate.is_privileged(&credentials) {
        request.extensions_mut().insert(credentials);
        return Ok(next.run(request).await);
    }

    tracing::warn!(
        gate = state.admin_gate.name(),
        path = %request.uri().path(),
        "Admin access denied"
    );

    if credentials.is_empty() && !token_presented {
        Err(ApiError::unauthorized())
    } else {
        Err(ApiError::forbidden())
    }
}
