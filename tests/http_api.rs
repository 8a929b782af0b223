//! End-to-end tests of the HTTP surface over the in-memory store.
//!
//! Each test builds a fresh router and drives it with `oneshot`, so no
//! listener or database is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hostel::config::{Config, StoreBackend};
use hostel::store::memory::MemoryStore;
use hostel::{api, AppState};

fn app() -> Router {
    let config = Config {
        store: StoreBackend::Memory,
        pass_secret: "test-pass-secret-0123456789".into(),
        ..Config::default()
    };
    let state = Arc::new(AppState::new(Arc::new(MemoryStore::new()), config));
    api::router(state)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Bootstrap admin, one room and one tenant with a portal login.
/// Returns (admin token, tenant token).
async fn seed(app: &Router) -> (String, String) {
    let (status, _) = call(
        app,
        "POST",
        "/api/auth/admin/signup",
        None,
        Some(json!({ "username": "warden", "email": "warden@hostel.test", "password": "warden-pass-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        app,
        "POST",
        "/api/auth/admin/login",
        None,
        Some(json!({ "login": "warden", "password": "warden-pass-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin = body["token"].as_str().unwrap().to_string();

    let (status, _) = call(
        app,
        "POST",
        "/api/admin/rooms",
        Some(&admin),
        Some(json!({ "room_no": "204", "floor": 2, "capacity": 2, "ac": true, "status": "Available" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        app,
        "POST",
        "/api/admin/tenants",
        Some(&admin),
        Some(json!({
            "id": 101,
            "name": "Asha Rao",
            "type": "Student",
            "email": "asha@hostel.test",
            "phone": "9800000001",
            "room": "204",
            "joined": "2026-01-10",
            "ac": true,
            "sleep_time": 23,
            "smoking": false,
            "status": "Active"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        app,
        "POST",
        "/api/auth/tenant/signup",
        None,
        Some(json!({ "tenant_id": 101, "password": "asha-pass-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        app,
        "POST",
        "/api/auth/tenant/login",
        None,
        Some(json!({ "tenant_id": 101, "password": "asha-pass-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Asha Rao");
    let tenant = body["token"].as_str().unwrap().to_string();

    (admin, tenant)
}

fn leave_body() -> Value {
    json!({
        "leave_from": "2099-01-01",
        "leave_to": "2099-01-05",
        "purpose": "Family function",
        "destination": "Pune",
        "emergency_contact": "9800000000"
    })
}

mod leave_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_leave_request_approved_once_and_pass_verifies() {
        let app = app();
        let (admin, tenant) = seed(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/tenant/leave-requests",
            Some(&tenant),
            Some(leave_body()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let request_id = body["request_id"].as_str().unwrap().to_string();
        assert_eq!(body["request"]["status"], "Pending");
        assert_eq!(body["request"]["room"], "204");

        let (status, body) = call(
            &app,
            "GET",
            "/api/admin/leave-requests/pending",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requests"].as_array().unwrap().len(), 1);

        let approve_uri = format!("/api/admin/leave-requests/{request_id}/approve");
        let (status, body) = call(&app, "POST", &approve_uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["request"]["status"], "Approved");
        assert_eq!(body["request"]["decided_by"], "warden");
        let pass_id = body["pass_id"].as_str().unwrap().to_string();
        assert!(pass_id.starts_with("L-"), "unexpected pass id {pass_id}");
        let token = body["pass_token"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "POST", &approve_uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "already_decided");

        let (status, body) = call(
            &app,
            "POST",
            "/api/tenant/passes/verify",
            Some(&tenant),
            Some(json!({ "token": token })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verification"]["valid"], true);
        assert_eq!(body["verification"]["kind"], "leave_pass");
        assert_eq!(body["verification"]["fields"]["pass_id"], pass_id.as_str());
        assert_eq!(body["verification"]["fields"]["extra"]["destination"], "Pune");

        let (status, body) = call(&app, "GET", "/api/tenant/passes/me", Some(&tenant), None).await;
        assert_eq!(status, StatusCode::OK);
        let passes = body["passes"].as_array().unwrap();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0]["valid"], true);
        assert_eq!(body["student_id"]["pass"]["pass_id"], "ID-101");
    }

    #[tokio::test]
    async fn test_reject_without_body_uses_default_reason() {
        let app = app();
        let (admin, tenant) = seed(&app).await;

        let (_, body) = call(
            &app,
            "POST",
            "/api/tenant/visitor-requests",
            Some(&tenant),
            Some(json!({
                "visitor_name": "Ravi Rao",
                "visitor_phone": "9800000002",
                "visit_date": "2099-02-01",
                "entry_time": "10:00",
                "purpose": "Visit",
                "valid_until": "18:00"
            })),
        )
        .await;
        let request_id = body["request_id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/admin/visitor-requests/{request_id}/reject"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["request"]["status"], "Rejected");
        assert_eq!(body["request"]["rejection_reason"], "No reason provided");

        let (_, body) = call(&app, "GET", "/api/tenant/passes/me", Some(&tenant), None).await;
        assert!(body["passes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_leave_request_is_rejected() {
        let app = app();
        let (_, tenant) = seed(&app).await;

        let mut body = leave_body();
        body["destination"] = json!("  ");
        let (status, body) = call(
            &app,
            "POST",
            "/api/tenant/leave-requests",
            Some(&tenant),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert!(body["error"].as_str().unwrap().contains("destination"));
    }

    #[tokio::test]
    async fn test_approving_unknown_request_is_not_found() {
        let app = app();
        let (admin, _) = seed(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/admin/leave-requests/LR-missing/approve",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_admin_route_without_session_is_unauthorized() {
        let app = app();
        let (status, body) = call(&app, "GET", "/api/admin/tenants", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "unauthorized");
    }

    #[tokio::test]
    async fn test_tenant_session_cannot_reach_admin_routes() {
        let app = app();
        let (_, tenant) = seed(&app).await;
        let (status, _) = call(&app, "GET", "/api/admin/tenants", Some(&tenant), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_second_admin_signup_needs_admin_session() {
        let app = app();
        let (admin, _) = seed(&app).await;
        let second = json!({ "username": "deputy", "email": "deputy@hostel.test", "password": "deputy-pass-1" });

        let (status, _) = call(&app, "POST", "/api/auth/admin/signup", None, Some(second.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            call(&app, "POST", "/api/auth/admin/signup", Some(&admin), Some(second)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "deputy");
    }

    #[tokio::test]
    async fn test_wrong_password_and_logout() {
        let app = app();
        let (admin, _) = seed(&app).await;

        let (status, _) = call(
            &app,
            "POST",
            "/api/auth/admin/login",
            None,
            Some(json!({ "login": "warden@hostel.test", "password": "nope-nope-nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&app, "POST", "/api/auth/logout", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["revoked"], true);

        let (status, _) = call(&app, "GET", "/api/admin/dashboard", Some(&admin), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

mod portal_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_and_unknown_route() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, body) = call(&app, "GET", "/api/nowhere", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn test_message_to_office_shows_in_conversations() {
        let app = app();
        let (admin, tenant) = seed(&app).await;

        let (status, _) = call(
            &app,
            "POST",
            "/api/tenant/messages",
            Some(&tenant),
            Some(json!({ "subject": "Wifi", "message": "The wifi is down on floor 2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&app, "GET", "/api/admin/conversations", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        let threads = body["conversations"].as_array().unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0]["student_id"], "101");
        assert_eq!(threads[0]["unread_count"], 1);
    }

    #[tokio::test]
    async fn test_tenant_replies_then_clears_thread() {
        let app = app();
        let (admin, tenant) = seed(&app).await;

        let (status, _) = call(
            &app,
            "POST",
            "/api/admin/messages",
            Some(&admin),
            Some(json!({ "receiver_id": "101", "subject": "Rent", "message": "Rent is due Friday" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = call(&app, "GET", "/api/tenant/messages/inbox", Some(&tenant), None).await;
        let id = body["messages"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/tenant/messages/{id}/reply"),
            Some(&tenant),
            Some(json!({ "message": "Paid by UPI" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"]["subject"], "Re: Rent");
        assert_eq!(body["message"]["receiver_id"], "admin");

        let (_, body) = call(&app, "GET", "/api/tenant/messages/conversation", Some(&tenant), None).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);

        let (status, body) = call(
            &app,
            "POST",
            "/api/tenant/messages/MSG-unknown/reply",
            Some(&tenant),
            Some(json!({ "message": "Hello?" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

        let (status, body) = call(&app, "DELETE", "/api/tenant/messages/conversation", Some(&tenant), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 2);

        let (_, body) = call(&app, "GET", "/api/admin/conversations", Some(&admin), None).await;
        assert!(body["conversations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complaint_priority_estimated_when_omitted() {
        let app = app();
        let (admin, tenant) = seed(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/tenant/complaints",
            Some(&tenant),
            Some(json!({ "description": "Water leaking from the ceiling", "complaint_type": "Plumbing" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["complaint"]["priority"], "High");
        assert_eq!(body["complaint"]["tenant_room"], "204");

        let (_, body) = call(&app, "GET", "/api/admin/complaints", Some(&admin), None).await;
        assert_eq!(body["pending"], 1);
    }

    #[tokio::test]
    async fn test_chat_answers_with_context() {
        let app = app();
        let (_, tenant) = seed(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/tenant/chat",
            Some(&tenant),
            Some(json!({ "message": "what is my room" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].as_str().unwrap().contains("Room: 204"));

        let (status, _) = call(
            &app,
            "POST",
            "/api/tenant/chat",
            Some(&tenant),
            Some(json!({ "message": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
