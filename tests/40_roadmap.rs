mod common;

use anyhow::Result;
use clientflow::database::models::RoadmapStatus;
use clientflow::testing;
use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

#[tokio::test]
async fn public_roadmap_groups_and_orders_items() -> Result<()> {
    let server = TestServer::spawn().await?;
    for item in [
        testing::roadmap_item("Invoices", RoadmapStatus::Planned, 3, 10),
        testing::roadmap_item("Waitlists", RoadmapStatus::Planned, 7, 0),
        testing::roadmap_item("Reminders", RoadmapStatus::Planned, 3, 20),
        testing::roadmap_item("Calendar sync", RoadmapStatus::InProgress, 0, 0),
        testing::roadmap_item("Booking pages", RoadmapStatus::Completed, 1, 0),
        testing::roadmap_item("Fax support", RoadmapStatus::Archived, 99, 0),
    ] {
        server.store.insert_roadmap_item(item);
    }

    let res = server.get("/api/public/roadmap").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;

    assert_eq!(body["items"].as_array().map(Vec::len), Some(5));
    let planned: Vec<&str> = body["grouped"]["planned"]
        .as_array()
        .expect("planned group")
        .iter()
        .filter_map(|i| i["title"].as_str())
        .collect();
    assert_eq!(planned, vec!["Waitlists", "Reminders", "Invoices"]);
    assert_eq!(body["grouped"]["in_progress"][0]["title"], "Calendar sync");
    assert_eq!(body["grouped"]["completed"][0]["title"], "Booking pages");
    Ok(())
}

#[tokio::test]
async fn concurrent_votes_are_all_counted() -> Result<()> {
    let server = TestServer::spawn().await?;
    let item = testing::roadmap_item("Invoices", RoadmapStatus::Planned, 0, 0);
    server.store.insert_roadmap_item(item.clone());

    let votes = 25;
    let requests = (0..votes).map(|_| {
        server
            .post("/api/public/roadmap/vote")
            .json(&json!({ "itemId": item.id }))
            .send()
    });
    for res in join_all(requests).await {
        assert_eq!(res?.status(), StatusCode::OK);
    }

    let body: Value = server
        .post("/api/public/roadmap/vote")
        .json(&json!({ "itemId": item.id }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["item"]["votes"], votes + 1);
    Ok(())
}

#[tokio::test]
async fn vote_rejects_missing_invalid_and_unknown_ids() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.post("/api/public/roadmap/vote").json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/api/public/roadmap/vote")
        .json(&json!({ "itemId": "feature-1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/api/public/roadmap/vote")
        .json(&json!({ "itemId": uuid::Uuid::new_v4() }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_manages_roadmap_content() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token();
    let path = "/api/admin/content/roadmap";

    let res = server
        .post(path)
        .bearer_auth(&admin)
        .json(&json!({ "description": "no title" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Title required");

    let body: Value = server
        .post(path)
        .bearer_auth(&admin)
        .json(&json!({ "title": "Invoices", "category": "Billing" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["item"]["status"], "planned");
    assert_eq!(body["item"]["priority"], 0);
    assert_eq!(body["item"]["createdBy"], testing::TEST_ADMIN_ID);
    let id = body["item"]["id"].as_str().expect("id").to_string();

    let body: Value = server
        .patch(path)
        .bearer_auth(&admin)
        .json(&json!({ "id": id, "status": "completed", "votes": 1000 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["item"]["status"], "completed");
    assert!(body["item"]["completedAt"].is_string());
    assert_eq!(body["item"]["votes"], 0);

    let body: Value = server
        .get(&format!("{}?status=completed", path))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["statusCounts"]["completed"], 1);

    let res = server
        .delete(&format!("{}?id={}", path, id))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .delete(&format!("{}?id={}", path, id))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.delete(path).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "ID required");
    Ok(())
}
