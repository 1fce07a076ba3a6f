mod common;

use std::sync::atomic::Ordering;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use clientflow::integrations::BusyInterval;
use clientflow::testing;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

/// First date of the given weekday at least a week out, clear of the lead time
fn upcoming(weekday: Weekday) -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(7);
    while date.weekday() != weekday {
        date += Duration::days(1);
    }
    date
}

#[tokio::test]
async fn check_email_reports_availability() -> Result<()> {
    let server = TestServer::spawn().await?;
    server
        .providers
        .identity
        .registered
        .lock()
        .unwrap()
        .push("taken@example.com".to_string());

    let res = server
        .post("/api/signup/check-email")
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["available"], false);
    assert_eq!(body["error"], "Invalid email format");

    let body: Value = server
        .post("/api/signup/check-email")
        .json(&json!({ "email": "Taken@Example.com" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["available"], false);
    assert!(body["message"].is_string());

    let body: Value = server
        .post("/api/signup/check-email")
        .json(&json!({ "email": "new@example.com" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["available"], true);
    Ok(())
}

#[tokio::test]
async fn billing_portal_needs_customer() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, no_customer) = server.tenant("org_a", "alpha");

    let res = server
        .post("/api/stripe/billing-portal")
        .bearer_auth(&no_customer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "No billing account found");

    let mut tenant = testing::tenant("org_b", "beta");
    tenant.stripe_customer_id = Some("cus_123".to_string());
    server.store.insert_tenant(tenant);
    let token = testing::session_token("user_b", Some("org_b"));

    let body: Value = server
        .post("/api/stripe/billing-portal")
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["url"], "https://billing.test/session/cus_123");

    server.providers.payments.fail.store(true, Ordering::SeqCst);
    let res = server
        .post("/api/stripe/billing-portal")
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn disconnect_deauthorizes_then_clears() -> Result<()> {
    let server = TestServer::spawn().await?;
    let mut tenant = testing::tenant("org_a", "alpha");
    tenant.stripe_account_id = Some("acct_9".to_string());
    tenant.integrations = json!({ "google_calendar": { "connected": true } });
    server.store.insert_tenant(tenant.clone());
    let token = testing::session_token("user_a", Some("org_a"));

    let body: Value = server
        .get("/api/integrations/status")
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["connected"], json!(["stripe", "google_calendar"]));

    let res = server
        .post("/api/stripe/connect/disconnect")
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);

    assert_eq!(
        *server.providers.payments.deauthorized.lock().unwrap(),
        vec!["acct_9".to_string()]
    );
    let stored = server.store.tenant(tenant.id).expect("tenant");
    assert!(stored.stripe_account_id.is_none());

    let body: Value = server
        .get("/api/integrations/status")
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["connected"], json!(["google_calendar"]));
    Ok(())
}

#[tokio::test]
async fn usage_reports_against_plan_limits() -> Result<()> {
    let server = TestServer::spawn().await?;
    let plan = testing::plan("Starter", 0);
    server.store.insert_plan(plan.clone());

    let mut tenant = testing::tenant("org_a", "alpha");
    tenant.plan_id = Some(plan.id);
    server.store.insert_tenant(tenant.clone());
    for _ in 0..25 {
        server.store.insert_contact(tenant.id);
    }
    server.store.insert_booking(tenant.id, Utc::now());
    server.store.insert_booking(tenant.id, Utc::now() - Duration::days(62));
    server.store.insert_service(testing::service(tenant.id, "Massage", true));

    let token = testing::session_token("user_a", Some("org_a"));
    let body: Value = server
        .get("/api/plan/usage")
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["plan"]["name"], "Starter");
    assert_eq!(body["usage"]["contacts"]["current"], 25);
    assert_eq!(body["usage"]["contacts"]["percentage"], 25);
    assert_eq!(body["usage"]["bookings"]["current"], 1);
    assert_eq!(body["usage"]["bookings"]["percentage"], 2);
    assert_eq!(body["usage"]["services"]["current"], 1);
    assert!(body["usage"]["services"]["limit"].is_null());
    assert!(body["usage"]["services"]["percentage"].is_null());
    Ok(())
}

#[tokio::test]
async fn availability_skips_busy_time() -> Result<()> {
    let server = TestServer::spawn().await?;
    let monday = upcoming(Weekday::Mon);
    let nine = monday.and_hms_opt(9, 0, 0).expect("time").and_utc();
    server.providers.calendar.busy.lock().unwrap().push(BusyInterval {
        start: nine,
        end: nine + Duration::hours(1),
    });

    let body: Value = server
        .get(&format!("/api/calendar/availability?date={}&duration=30", monday))
        .send()
        .await?
        .json()
        .await?;
    let times: Vec<&str> = body["slots"]
        .as_array()
        .expect("slots")
        .iter()
        .filter_map(|s| s["time"].as_str())
        .collect();
    assert_eq!(times, vec!["10:00", "10:30", "11:00", "11:30"]);

    let body: Value = server
        .get(&format!("/api/calendar/availability?date={}&duration=90", monday))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["slots"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn availability_rejects_oversized_duration() -> Result<()> {
    let server = TestServer::spawn().await?;
    let monday = upcoming(Weekday::Mon);

    for duration in ["1441", "200000000000", "9000000000000000000"] {
        let res = server
            .get(&format!("/api/calendar/availability?date={}&duration={}", monday, duration))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "duration={}", duration);
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "Duration must be between 1 and 1440 minutes");
    }

    let res = server
        .get(&format!("/api/calendar/availability?date={}&duration=1440", monday))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["slots"], json!([]));
    Ok(())
}

#[tokio::test]
async fn availability_without_provider_call() -> Result<()> {
    let server = TestServer::spawn().await?;

    let sunday = upcoming(Weekday::Sun);
    let body: Value = server
        .get(&format!("/api/calendar/availability?date={}", sunday))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["slots"], json!([]));

    let today = Utc::now().date_naive();
    let body: Value = server
        .get(&format!("/api/calendar/availability?date={}", today))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["slots"], json!([]));

    assert_eq!(server.providers.calendar.call_count(), 0);

    let res = server.get("/api/calendar/availability").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Date is required");

    let res = server
        .get(&format!("/api/calendar/availability?date={}&duration=0", sunday))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.providers.calendar.fail.store(true, Ordering::SeqCst);
    let res = server
        .get(&format!("/api/calendar/availability?date={}", upcoming(Weekday::Tue)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn upload_validates_and_forwards() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.tenant("org_a", "acme");

    let image = || Part::bytes(vec![1u8; 64]).file_name("logo.png").mime_str("image/png");

    let form = Form::new().part("file", image()?).text("alt", "ok");
    let res = server.post("/api/upload").bearer_auth(&token).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Description is required (minimum 3 characters)");

    let text = Part::bytes(b"hello".to_vec()).file_name("notes.txt").mime_str("text/plain")?;
    let form = Form::new().part("file", text).text("alt", "Shop notes");
    let res = server.post("/api/upload").bearer_auth(&token).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let form = Form::new()
        .part("file", image()?)
        .text("alt", "Acme Logo")
        .text("type", "logo");
    let res = server.post("/api/upload").bearer_auth(&token).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["resourceType"], "image");
    assert!(body["publicId"].as_str().unwrap_or_default().starts_with("clientflow/acme/acme-logo-"));

    let requests = server.providers.uploads.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].folder, "clientflow/acme");
    assert_eq!(requests[0].tags, vec!["logo", "acme"]);
    Ok(())
}

#[tokio::test]
async fn oversized_upload_is_rejected() -> Result<()> {
    let mut config = testing::test_config();
    config.uploads.max_image_bytes = 16;
    let server = TestServer::spawn_with(config).await?;
    let (_, token) = server.tenant("org_a", "acme");

    let part = Part::bytes(vec![0u8; 32]).file_name("big.png").mime_str("image/png")?;
    let form = Form::new().part("file", part).text("alt", "Big picture");
    let res = server.post("/api/upload").bearer_auth(&token).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.providers.uploads.requests.lock().unwrap().is_empty());
    Ok(())
}
