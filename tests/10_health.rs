mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::TestServer;

#[tokio::test]
async fn root_describes_service() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get("/").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["name"], "ClientFlow API");
    assert!(body["endpoints"]["plans"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_database_state() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get("/health").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["database"], "ok");

    server.store.set_healthy(false);
    let res = server.get("/health").send().await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "degraded");
    Ok(())
}

#[tokio::test]
async fn malformed_json_uses_error_shape() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .post("/api/public/roadmap/vote")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Invalid request body");
    Ok(())
}
