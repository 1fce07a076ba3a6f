use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::middleware::CurrentTenant;

/// GET /api/integrations/status - Names of the tenant's connected integrations
pub async fn integrations_status(
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
) -> Json<Value> {
    Json(json!({ "connected": tenant.connected_integrations() }))
}
