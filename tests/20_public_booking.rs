mod common;

use anyhow::Result;
use clientflow::testing;
use reqwest::StatusCode;
use serde_json::Value;

use common::TestServer;

#[tokio::test]
async fn pricing_lists_active_plans_without_internal_fields() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.store.insert_plan(testing::plan("Pro", 1));
    server.store.insert_plan(testing::plan("Starter", 0));
    let mut retired = testing::plan("Legacy", 2);
    retired.active = false;
    server.store.insert_plan(retired);

    let res = server.get("/api/plans").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    let plans = body["plans"].as_array().expect("plans array");
    let names: Vec<&str> = plans.iter().filter_map(|p| p["name"].as_str()).collect();
    assert_eq!(names, vec!["Starter", "Pro"]);

    for plan in plans {
        assert!(plan.get("stripePriceId").is_none());
        assert!(plan.get("sortOrder").is_none());
        assert!(plan.get("priceMonthly").is_some());
    }
    Ok(())
}

#[tokio::test]
async fn business_page_shows_only_active_services() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (tenant, _) = server.tenant("org_acme", "acme");
    server.store.insert_service(testing::service(tenant.id, "Massage", true));
    server.store.insert_service(testing::service(tenant.id, "Facial", true));
    server.store.insert_service(testing::service(tenant.id, "Retired", false));

    let body: Value = server.get("/api/public/acme").send().await?.json().await?;
    assert_eq!(body["business"]["name"], "acme Studio");
    assert_eq!(body["business"]["slug"], "acme");

    let res = server.get("/api/public/acme/services").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let names: Vec<&str> = body["services"]
        .as_array()
        .expect("services array")
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Facial", "Massage"]);
    Ok(())
}

#[tokio::test]
async fn service_lookup_is_scoped_to_business() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (acme, _) = server.tenant("org_acme", "acme");
    let (other, _) = server.tenant("org_other", "other");

    let active = testing::service(acme.id, "Massage", true);
    let inactive = testing::service(acme.id, "Retired", false);
    let foreign = testing::service(other.id, "Haircut", true);
    for service in [&active, &inactive, &foreign] {
        server.store.insert_service(service.clone());
    }

    let res = server
        .get(&format!("/api/public/acme/services/{}", active.id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["service"]["name"], "Massage");
    assert!(body["service"].get("tenantId").is_none());

    for id in [inactive.id.to_string(), foreign.id.to_string(), "not-a-uuid".to_string()] {
        let res = server
            .get(&format!("/api/public/acme/services/{}", id))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "Service not found");
    }
    Ok(())
}

#[tokio::test]
async fn unknown_or_blank_slug() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get("/api/public/nobody/services").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Business not found");

    let res = server.get("/api/public/%20/services").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Slug is required");
    Ok(())
}
