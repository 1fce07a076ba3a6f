use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::api::ApiJson;
use crate::database::models::{NewService, Service, ServiceChanges};
use crate::error::ApiError;
use crate::middleware::CurrentTenant;
use crate::services::usage::{check_service_limit, month_start};
use crate::state::AppState;

const MAX_DESCRIPTION_CHARS: usize = 2000;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[serde(default, with = "crate::database::models::plan::double_option")]
    pub description: Option<Option<String>>,
    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes"))]
    pub duration: Option<i32>,
    pub price: Option<Decimal>,
    pub active: Option<bool>,
}

impl ServiceRequest {
    /// Field rules shared by create and update; absent fields pass
    fn check(&mut self) -> Result<(), ApiError> {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
        self.validate()?;

        if self.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(ApiError::validation("Price must be 0 or greater"));
        }

        if let Some(Some(description)) = self.description.as_mut() {
            *description = description.trim().to_string();
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(ApiError::validation(
                    "Description must be less than 2000 characters",
                ));
            }
        }

        Ok(())
    }

    fn into_changes(self) -> ServiceChanges {
        ServiceChanges {
            name: self.name,
            description: self
                .description
                .map(|d| d.filter(|text| !text.is_empty())),
            duration: self.duration,
            price: self.price,
            active: self.active,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub active: Option<String>,
}

fn service_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found("Service not found"))
}

/// GET /api/services?active=true - Tenant's services, optionally only active
pub async fn services_list(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Service>>, ApiError> {
    let services = if query.active.as_deref() == Some("true") {
        state.store.services.list_active(tenant.id).await?
    } else {
        state.store.services.list(tenant.id).await?
    };
    Ok(Json(services))
}

/// POST /api/services - Add a service, within the plan's service limit
///
/// The limit is checked before the body; a full plan answers 403 with
/// `code: LIMIT_REACHED`.
pub async fn service_create(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    ApiJson(mut body): ApiJson<ServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let plan = match tenant.plan_id {
        Some(plan_id) => state.store.plans.find(plan_id).await?,
        None => None,
    };
    let counts = state
        .store
        .tenants
        .usage_counts(tenant.id, month_start(Utc::now()))
        .await?;
    check_service_limit(plan.as_ref(), &counts)?;

    body.check()?;
    let (Some(name), Some(duration), Some(price)) = (body.name.clone(), body.duration, body.price)
    else {
        return Err(ApiError::validation("Name, duration and price are required"));
    };
    let changes = body.into_changes();

    let created = state
        .store
        .services
        .create(NewService {
            tenant_id: tenant.id,
            name,
            description: changes.description.flatten(),
            duration,
            price,
            active: changes.active.unwrap_or(true),
        })
        .await?;

    tracing::info!(tenant_id = %tenant.id, service_id = %created.id, "Service created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/services/:id
pub async fn service_get(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    Path(id): Path<String>,
) -> Result<Json<Service>, ApiError> {
    let id = service_id(&id)?;
    state
        .store
        .services
        .find(tenant.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Service not found"))
}

/// PATCH /api/services/:id - Partial update, tenant-filtered
pub async fn service_update(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    Path(id): Path<String>,
    ApiJson(mut body): ApiJson<ServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    let id = service_id(&id)?;
    body.check()?;

    let updated = state
        .store
        .services
        .update(tenant.id, id, &body.into_changes())
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    Ok(Json(updated))
}

/// DELETE /api/services/:id
pub async fn service_delete(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = service_id(&id)?;

    if !state.store.services.delete(tenant.id, id).await? {
        return Err(ApiError::not_found("Service not found"));
    }

    tracing::info!(tenant_id = %tenant.id, service_id = %id, "Service deleted");

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ServiceRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn field_rules() {
        assert!(request(r#"{"name":"Deep tissue","duration":60,"price":80}"#).check().is_ok());
        assert!(request(r#"{"name":"X"}"#).check().is_err());
        assert!(request(r#"{"duration":0}"#).check().is_err());
        assert!(request(r#"{"price":-1}"#).check().is_err());

        let long = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        let mut body = request(&format!(r#"{{"description":"{}"}}"#, long));
        assert!(body.check().is_err());
    }

    #[test]
    fn blank_description_clears() {
        let mut body = request(r#"{"description":"   "}"#);
        body.check().unwrap();
        assert_eq!(body.into_changes().description, Some(None));

        let mut body = request(r#"{"name":"Facial"}"#);
        body.check().unwrap();
        assert_eq!(body.into_changes().description, None);
    }
}
