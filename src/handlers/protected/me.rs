use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::auth::Session;

/// GET /api/me - Identity of the verified session
pub async fn me_get(Extension(session): Extension<Session>) -> Json<Value> {
    Json(json!({
        "userId": session.user_id,
        "orgId": session.org_id,
        "message": "Authenticated",
    }))
}
