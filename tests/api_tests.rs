mod common;

use reqwest::StatusCode;
use serde_json::json;

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

// ── Registration & Auth ─────────────────────────────────────────

#[tokio::test]
async fn register_creates_organization_and_tokens() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("owner@test.com", "password123", "Owner").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    let org_id = app.organization_id("owner@test.com").await;
    let name: String = sqlx::query_scalar("SELECT name FROM organizations WHERE id = $1")
        .bind(org_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(name, "Owner's Workspace");

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = common::spawn_app().await;

    let (_, status) = app.register("owner@test.com", "short", "Owner").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (_, status) = app.register("owner@test.com", "password123", "Again").await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_valid_and_invalid_credentials() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app.login("owner@test.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    let (_, status) = app.login("owner@test.com", "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.login("nobody@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn refresh_token_rotation_and_reuse_detection() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (login_body, _) = app.login("owner@test.com", "password123").await;
    let refresh = login_body["refresh_token"].as_str().unwrap();

    // First refresh succeeds and rotates
    let resp = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_ne!(body["refresh_token"].as_str().unwrap(), refresh);

    // Replaying the old token revokes everything
    let resp2 = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp2.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn protected_routes_require_auth() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api/v1/employees"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Employees: list & toggle ────────────────────────────────────

#[tokio::test]
async fn employee_list_starts_empty() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app.get_auth("/api/v1/employees", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employees"].as_array().unwrap().len(), 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn toggle_flips_exactly_one_employee() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let org = app.organization_id("owner@test.com").await;

    let target = app.seed_employee(org, 101, "Avery", false, false).await;
    let other = app.seed_employee(org, 102, "Blake", false, false).await;

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/employees/{target}/enabled"),
            &token,
            &json!({ "enabled": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["employee_id"].as_str().unwrap(), target.to_string());
    assert_eq!(body["enabled"], json!(true));

    // The other record is untouched
    let (list, _) = app.get_auth("/api/v1/employees", &token).await;
    let employees = list["employees"].as_array().unwrap();
    let untouched = employees
        .iter()
        .find(|e| e["id"].as_str().unwrap() == other.to_string())
        .unwrap();
    assert_eq!(untouched["enabled"], json!(false));
    assert_eq!(untouched["name"], json!("Blake"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn toggle_rejects_enabling_removed_employee() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let org = app.organization_id("owner@test.com").await;

    let gone = app.seed_employee(org, 103, "Casey", false, true).await;

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/employees/{gone}/enabled"),
            &token,
            &json!({ "enabled": true }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("cannot be enabled"));

    // Disabling a removed employee is still fine (a no-op)
    let (_, status) = app
        .put_auth(
            &format!("/api/v1/employees/{gone}/enabled"),
            &token,
            &json!({ "enabled": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn toggle_unknown_employee_is_not_found() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/employees/{}/enabled", uuid::Uuid::now_v7()),
            &token,
            &json!({ "enabled": true }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn employees_are_organization_scoped() {
    let app = common::spawn_app().await;
    let token_a = app.bootstrap().await;
    let org_a = app.organization_id("owner@test.com").await;
    let employee = app.seed_employee(org_a, 104, "Drew", false, false).await;

    let (other_body, _) = app.register("other@test.com", "password123", "Other").await;
    let token_b = other_body["access_token"].as_str().unwrap();

    // Org B sees an empty list and cannot toggle org A's employee
    let (list, _) = app.get_auth("/api/v1/employees", token_b).await;
    assert_eq!(list["employees"].as_array().unwrap().len(), 0);

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/employees/{employee}/enabled"),
            token_b,
            &json!({ "enabled": true }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // And org A still sees its own record, untouched
    let (list, _) = app.get_auth("/api/v1/employees", &token_a).await;
    assert_eq!(list["employees"].as_array().unwrap().len(), 1);
    assert_eq!(list["employees"][0]["enabled"], json!(false));

    common::cleanup(app).await;
}

// ── Sync error paths ────────────────────────────────────────────

#[tokio::test]
async fn sync_without_provider_is_invalid_state() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .post_auth("/api/v1/employees/sync", &token, &json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No provider"));

    common::cleanup(app).await;
}

// ── Provider connection ─────────────────────────────────────────

#[tokio::test]
async fn provider_connect_and_status_without_secrets() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .put_auth(
            "/api/v1/provider",
            &token,
            &json!({
                "provider": "crewhub",
                "subdomain": "acme",
                "domain": "crewhub.example",
                "access_token": "at-secret",
                "refresh_token": "rt-secret",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "connect failed: {body}");
    assert_eq!(body["provider"], json!("crewhub"));
    assert!(body.get("access_token").is_none());
    assert!(body.get("access_token_enc").is_none());

    let (status_body, status) = app.get_auth("/api/v1/provider", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_body["subdomain"], json!("acme"));
    assert!(!status_body.to_string().contains("at-secret"));

    // Tokens are not stored in the clear
    let stored: Vec<u8> = sqlx::query_scalar(
        "SELECT access_token_enc FROM provider_connections LIMIT 1",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_ne!(stored, b"at-secret".to_vec());

    common::cleanup(app).await;
}

#[tokio::test]
async fn provider_connect_rejects_unknown_tag() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (_, status) = app
        .put_auth(
            "/api/v1/provider",
            &token,
            &json!({
                "provider": "fleetomatic",
                "subdomain": "acme",
                "domain": "example.com",
                "access_token": "a",
                "refresh_token": "r",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn provider_connect_requires_owner() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    // Add a plain member, then try to connect as them
    let (_, status) = app
        .post_auth(
            "/api/v1/organization/members",
            &token,
            &json!({
                "email": "member@test.com",
                "password": "password123",
                "name": "Member",
                "role": "member",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (member_login, _) = app.login("member@test.com", "password123").await;
    let member_token = member_login["access_token"].as_str().unwrap();

    let (_, status) = app
        .put_auth(
            "/api/v1/provider",
            member_token,
            &json!({
                "provider": "fieldline",
                "subdomain": "acme",
                "domain": "fieldline.example",
                "access_token": "a",
                "refresh_token": "r",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn provider_disconnect_clears_connection() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    app.put_auth(
        "/api/v1/provider",
        &token,
        &json!({
            "provider": "fieldline",
            "subdomain": "acme",
            "domain": "fieldline.example",
            "access_token": "a",
            "refresh_token": "r",
        }),
    )
    .await;

    let (_, status) = app.delete_auth("/api/v1/provider", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth("/api/v1/provider", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

// ── Organization & members ──────────────────────────────────────

#[tokio::test]
async fn member_management_round_trip() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (member, status) = app
        .post_auth(
            "/api/v1/organization/members",
            &token,
            &json!({
                "email": "member@test.com",
                "password": "password123",
                "name": "Member",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["role"], json!("member"));
    assert!(member.get("password_hash").is_none());

    let (list, _) = app.get_auth("/api/v1/organization/members", &token).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let member_id = member["id"].as_str().unwrap();
    let (_, status) = app
        .delete_auth(&format!("/api/v1/organization/members/{member_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (list, _) = app.get_auth("/api/v1/organization/members", &token).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    common::cleanup(app).await;
}

// ── Bookings & availability ─────────────────────────────────────

#[tokio::test]
async fn booking_requires_enabled_employee() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let org = app.organization_id("owner@test.com").await;

    let disabled = app.seed_employee(org, 201, "Off", false, false).await;
    let removed = app.seed_employee(org, 202, "Gone", false, true).await;

    for employee in [disabled, removed] {
        let (_, status) = app
            .post_auth(
                "/api/v1/bookings",
                &token,
                &json!({
                    "employee_id": employee,
                    "customer_name": "Pat",
                    "customer_email": "pat@example.com",
                    "starts_at": "2025-06-02T09:00:00Z",
                    "ends_at": "2025-06-02T09:30:00Z",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    common::cleanup(app).await;
}

#[tokio::test]
async fn booking_rejects_overlap() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let org = app.organization_id("owner@test.com").await;
    let employee = app.seed_employee(org, 203, "On", true, false).await;

    let first = json!({
        "employee_id": employee,
        "customer_name": "Pat",
        "customer_email": "pat@example.com",
        "starts_at": "2025-06-02T09:00:00Z",
        "ends_at": "2025-06-02T10:00:00Z",
    });
    let (_, status) = app.post_auth("/api/v1/bookings", &token, &first).await;
    assert_eq!(status, StatusCode::OK);

    // Overlapping second booking
    let overlap = json!({
        "employee_id": employee,
        "customer_name": "Sam",
        "customer_email": "sam@example.com",
        "starts_at": "2025-06-02T09:30:00Z",
        "ends_at": "2025-06-02T10:30:00Z",
    });
    let (_, status) = app.post_auth("/api/v1/bookings", &token, &overlap).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Back-to-back is fine
    let adjacent = json!({
        "employee_id": employee,
        "customer_name": "Sam",
        "customer_email": "sam@example.com",
        "starts_at": "2025-06-02T10:00:00Z",
        "ends_at": "2025-06-02T10:30:00Z",
    });
    let (_, status) = app.post_auth("/api/v1/bookings", &token, &adjacent).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn availability_excludes_booked_slots() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let org = app.organization_id("owner@test.com").await;
    let employee = app.seed_employee(org, 204, "Avail", true, false).await;

    // Default hours are 09:00-17:00 with 30-minute slots = 16 slots
    let (body, status) = app
        .get_auth(
            &format!("/api/v1/employees/{employee}/availability?date=2025-06-02"),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"].as_array().unwrap().len(), 16);

    app.post_auth(
        "/api/v1/bookings",
        &token,
        &json!({
            "employee_id": employee,
            "customer_name": "Pat",
            "customer_email": "pat@example.com",
            "starts_at": "2025-06-02T09:00:00Z",
            "ends_at": "2025-06-02T10:00:00Z",
        }),
    )
    .await;

    let (body, _) = app
        .get_auth(
            &format!("/api/v1/employees/{employee}/availability?date=2025-06-02"),
            &token,
        )
        .await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 14);
    assert_eq!(body["slots"][0]["starts_at"], json!("2025-06-02T10:00:00Z"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn availability_of_disabled_employee_is_rejected() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let org = app.organization_id("owner@test.com").await;
    let employee = app.seed_employee(org, 205, "Off", false, false).await;

    let (_, status) = app
        .get_auth(
            &format!("/api/v1/employees/{employee}/availability?date=2025-06-02"),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}
