use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{resolve_tenant, Session};
use crate::database::models::Tenant;
use crate::error::ApiError;
use crate::state::AppState;

/// Caller's tenant, resolved from the session's organization
#[derive(Clone, Debug)]
pub struct CurrentTenant(pub Tenant);

/// Resolves the tenant for the verified session and injects `CurrentTenant`.
/// Must run after `session_auth_middleware`.
pub async fn validate_tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(ApiError::unauthorized)?;

    let tenant = resolve_tenant(&state.store, &session).await?;
    request.extensions_mut().insert(CurrentTenant(tenant));

    Ok(next.run(request).await)
}
