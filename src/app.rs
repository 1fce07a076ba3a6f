use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers;
use crate::middleware::{
    admin_gate_middleware, error_detail_middleware, session_auth_middleware,
    validate_tenant_middleware,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Identity provider session
        .merge(session_routes(state.clone()))
        // Session plus resolved tenant
        .merge(tenant_routes(state.clone()))
        // Admin gate
        .merge(admin_routes(state.clone()))
        // Global middleware
        .layer(from_fn_with_state(state.clone(), error_detail_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public::{business, calendar, plans, roadmap, signup};

    Router::new()
        .route("/api/plans", get(plans::plans_list))
        .route("/api/public/roadmap", get(roadmap::roadmap_list))
        .route("/api/public/roadmap/vote", post(roadmap::roadmap_vote))
        .route("/api/public/:slug", get(business::business_get))
        .route("/api/public/:slug/services", get(business::services_list))
        .route("/api/public/:slug/services/:id", get(business::service_get))
        .route("/api/calendar/availability", get(calendar::availability_get))
        .route("/api/signup/check-email", post(signup::check_email))
}

fn session_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::me;

    Router::new()
        .route("/api/me", get(me::me_get))
        .route_layer(from_fn_with_state(state, session_auth_middleware))
}

fn tenant_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{billing, integrations, overrides, services, upload, usage};

    Router::new()
        .route(
            "/api/availability/overrides",
            get(overrides::overrides_list).post(overrides::override_create),
        )
        .route(
            "/api/availability/overrides/:id",
            patch(overrides::override_update).delete(overrides::override_delete),
        )
        .route(
            "/api/services",
            get(services::services_list).post(services::service_create),
        )
        .route(
            "/api/services/:id",
            get(services::service_get)
                .patch(services::service_update)
                .delete(services::service_delete),
        )
        .route("/api/integrations/status", get(integrations::integrations_status))
        .route("/api/plan/usage", get(usage::usage_get))
        .route("/api/stripe/billing-portal", post(billing::billing_portal))
        .route("/api/stripe/connect/disconnect", post(billing::connect_disconnect))
        .route("/api/upload", post(upload::upload_post))
        // Last added runs first: session, then tenant
        .route_layer(from_fn_with_state(state.clone(), validate_tenant_middleware))
        .route_layer(from_fn_with_state(state, session_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::elevated::{plans, roadmap};

    Router::new()
        .route("/api/plans/debug", get(plans::plans_debug))
        .route(
            "/api/admin/plans",
            get(plans::plans_list)
                .post(plans::plan_create)
                .patch(plans::plan_update)
                .delete(plans::plan_delete),
        )
        .route("/api/admin/plans/reorder", post(plans::plans_reorder))
        .route(
            "/api/admin/content/roadmap",
            get(roadmap::items_list)
                .post(roadmap::item_create)
                .patch(roadmap::item_update)
                .delete(roadmap::item_delete),
        )
        .route_layer(from_fn_with_state(state, admin_gate_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "ClientFlow API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multi-tenant CRM and booking API",
        "endpoints": {
            "health": "/health (public)",
            "plans": "/api/plans (public)",
            "public": "/api/public/:slug[/services[/:id]] (public)",
            "roadmap": "/api/public/roadmap[/vote] (public)",
            "calendar": "/api/calendar/availability (public)",
            "signup": "/api/signup/check-email (public)",
            "me": "/api/me (session)",
            "tenant": "/api/services/*, /api/availability/*, /api/integrations/*, /api/plan/*, /api/stripe/*, /api/upload (session + tenant)",
            "admin": "/api/plans/debug, /api/admin/* (admin gate)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
