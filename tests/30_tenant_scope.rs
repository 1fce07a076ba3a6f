mod common;

use anyhow::Result;
use clientflow::testing;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

const TENANT_ROUTES: &[(&str, &str)] = &[
    ("GET", "/api/availability/overrides"),
    ("POST", "/api/availability/overrides"),
    ("PATCH", "/api/availability/overrides/00000000-0000-0000-0000-000000000000"),
    ("DELETE", "/api/availability/overrides/00000000-0000-0000-0000-000000000000"),
    ("GET", "/api/integrations/status"),
    ("GET", "/api/plan/usage"),
    ("GET", "/api/services"),
    ("POST", "/api/services"),
    ("GET", "/api/services/00000000-0000-0000-0000-000000000000"),
    ("PATCH", "/api/services/00000000-0000-0000-0000-000000000000"),
    ("DELETE", "/api/services/00000000-0000-0000-0000-000000000000"),
    ("POST", "/api/stripe/billing-portal"),
    ("POST", "/api/stripe/connect/disconnect"),
    ("POST", "/api/upload"),
];

#[tokio::test]
async fn tenant_routes_require_a_session() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.tenant("org_acme", "acme");
    let accesses = server.store.access_count();

    for (method, path) in TENANT_ROUTES {
        let builder = match *method {
            "GET" => server.get(path),
            "POST" => server.post(path),
            "PATCH" => server.patch(path),
            _ => server.delete(path),
        };
        let res = builder.send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{} {}", method, path);
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "Unauthorized");
    }

    let res = server
        .get("/api/plan/usage")
        .bearer_auth("not-a-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(server.store.access_count(), accesses, "store touched before auth");
    Ok(())
}

#[tokio::test]
async fn session_without_organization_or_tenant() -> Result<()> {
    let server = TestServer::spawn().await?;

    let no_org = testing::session_token("user_1", None);
    let res = server
        .get("/api/integrations/status")
        .bearer_auth(&no_org)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let unknown_org = testing::session_token("user_1", Some("org_missing"));
    let res = server
        .get("/api/integrations/status")
        .bearer_auth(&unknown_org)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Tenant not found");
    Ok(())
}

#[tokio::test]
async fn me_echoes_session_from_cookie() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = testing::session_token("user_42", Some("org_9"));

    let res = server
        .get("/api/me")
        .header("cookie", format!("theme=dark; __session={}", token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["userId"], "user_42");
    assert_eq!(body["orgId"], "org_9");

    let res = server.get("/api/me").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn override_lifecycle() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.tenant("org_acme", "acme");

    let res = server
        .post("/api/availability/overrides")
        .bearer_auth(&token)
        .json(&json!({
            "date": "2030-07-04",
            "type": "custom",
            "startTime": "10:00",
            "endTime": "12:30",
            "reason": "Holiday hours"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    assert_eq!(created["type"], "custom");
    assert_eq!(created["startTime"], "10:00");
    let id = created["id"].as_str().expect("id").to_string();

    let res = server
        .post("/api/availability/overrides")
        .bearer_auth(&token)
        .json(&json!({ "date": "2030-07-04", "type": "closed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server
        .patch(&format!("/api/availability/overrides/{}", id))
        .bearer_auth(&token)
        .json(&json!({ "type": "closed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["type"], "closed");
    assert!(updated["startTime"].is_null());
    assert_eq!(updated["reason"], "Holiday hours");

    let list: Value = server
        .get("/api/availability/overrides")
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let res = server
        .delete(&format!("/api/availability/overrides/{}", id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn override_validation() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.tenant("org_acme", "acme");

    let cases = [
        (json!({ "type": "closed" }), "Date and type are required"),
        (json!({ "date": "2030-07-04", "type": "open" }), "Type must be 'closed' or 'custom'"),
        (json!({ "date": "07/04/2030", "type": "closed" }), "Invalid date format. Use YYYY-MM-DD"),
        (
            json!({ "date": "2030-07-04", "type": "custom", "startTime": "10:00" }),
            "Start time and end time are required for custom hours",
        ),
        (
            json!({ "date": "2030-07-04", "type": "custom", "startTime": "9am", "endTime": "5pm" }),
            "Times must be in HH:MM format",
        ),
        (
            json!({ "date": "2030-07-04", "type": "custom", "startTime": "14:00", "endTime": "09:00" }),
            "Start time must be before end time",
        ),
    ];

    for (payload, message) in cases {
        let res = server
            .post("/api/availability/overrides")
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", payload);
        let body: Value = res.json().await?;
        assert_eq!(body["error"], message);
    }
    Ok(())
}

#[tokio::test]
async fn overrides_are_isolated_between_tenants() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, owner) = server.tenant("org_a", "alpha");
    let (_, intruder) = server.tenant("org_b", "beta");

    let created: Value = server
        .post("/api/availability/overrides")
        .bearer_auth(&owner)
        .json(&json!({ "date": "2030-12-25", "type": "closed" }))
        .send()
        .await?
        .json()
        .await?;
    let id = created["id"].as_str().expect("id").to_string();

    let list: Value = server
        .get("/api/availability/overrides")
        .bearer_auth(&intruder)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list.as_array().map(Vec::len), Some(0));

    let res = server
        .patch(&format!("/api/availability/overrides/{}", id))
        .bearer_auth(&intruder)
        .json(&json!({ "reason": "mine now" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .delete(&format!("/api/availability/overrides/{}", id))
        .bearer_auth(&intruder)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Override not found");

    // The intruder can use the same date for itself
    let res = server
        .post("/api/availability/overrides")
        .bearer_auth(&intruder)
        .json(&json!({ "date": "2030-12-25", "type": "closed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let list: Value = server
        .get("/api/availability/overrides")
        .bearer_auth(&owner)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list[0]["id"], id.as_str());
    assert!(list[0]["reason"].is_null());
    Ok(())
}
