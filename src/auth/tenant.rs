use crate::auth::Session;
use crate::database::models::Tenant;
use crate::database::Store;
use crate::error::ApiError;

/// Resolve the caller's tenant from their session's organization.
/// Exactly one tenant read; the tenant is never taken from the client.
pub async fn resolve_tenant(store: &Store, session: &Session) -> Result<Tenant, ApiError> {
    let org_id = session.org_id.as_deref().ok_or_else(ApiError::unauthorized)?;

    store
        .tenants
        .find_by_org_id(org_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant not found"))
}
