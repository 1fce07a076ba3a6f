use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::models::{PublicService, Tenant};
use crate::error::ApiError;
use crate::state::AppState;

async fn tenant_by_slug(state: &AppState, slug: &str) -> Result<Tenant, ApiError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(ApiError::validation("Slug is required"));
    }

    state
        .store
        .tenants
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Business not found"))
}

async fn active_services(state: &AppState, tenant: &Tenant) -> Result<Vec<PublicService>, ApiError> {
    Ok(state
        .store
        .services
        .list_active(tenant.id)
        .await?
        .into_iter()
        .map(PublicService::from)
        .collect())
}

/// GET /api/public/:slug - Business profile with its active services
pub async fn business_get(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tenant = tenant_by_slug(&state, &slug).await?;
    let services = active_services(&state, &tenant).await?;

    Ok(Json(json!({
        "business": {
            "name": tenant.display_name(),
            "slug": tenant.slug,
            "description": tenant.business_description,
        },
        "services": services,
    })))
}

/// GET /api/public/:slug/services - Active services, by name
pub async fn services_list(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tenant = tenant_by_slug(&state, &slug).await?;
    let services = active_services(&state, &tenant).await?;

    Ok(Json(json!({ "services": services })))
}

/// GET /api/public/:slug/services/:id - One active service of the business
///
/// Inactive services, services of other businesses and ids that are not
/// UUIDs all answer 404.
pub async fn service_get(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let tenant = tenant_by_slug(&state, &slug).await?;

    let Ok(service_id) = uuid::Uuid::parse_str(id.trim()) else {
        return Err(ApiError::not_found("Service not found"));
    };

    let service = state
        .store
        .services
        .find_active(tenant.id, service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    Ok(Json(json!({ "service": PublicService::from(service) })))
}
