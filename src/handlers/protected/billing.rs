use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::CurrentTenant;
use crate::state::AppState;

/// POST /api/stripe/billing-portal - Billing portal session for the tenant
pub async fn billing_portal(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
) -> Result<Json<Value>, ApiError> {
    let customer_id = tenant
        .stripe_customer_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::not_found("No billing account found"))?;

    let url = state.payments.create_portal_session(customer_id).await?;

    Ok(Json(json!({ "url": url })))
}

/// POST /api/stripe/connect/disconnect - Detach the tenant's connected account
///
/// The account is deauthorized at the processor first; the stored id is only
/// cleared once that succeeds.
pub async fn connect_disconnect(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
) -> Result<Json<Value>, ApiError> {
    if let Some(account_id) = tenant.stripe_account_id.as_deref() {
        state.payments.deauthorize_account(account_id).await?;
    }

    state.store.tenants.clear_connected_account(tenant.id).await?;

    tracing::info!(tenant_id = %tenant.id, "Connected account disconnected");

    Ok(Json(json!({ "success": true })))
}
