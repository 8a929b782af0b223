//! Webhook delivery against a local mock endpoint.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hostel::models::request::{LeaveDetails, Request, RequestDetails, RequestKind, RequestStatus};
use hostel::notification::webhook::{WebhookEvent, WebhookNotifier};

fn approved_request() -> Request {
    Request {
        request_id: "LR-42".into(),
        kind: RequestKind::Leave,
        subject_id: "12".into(),
        subject_name: "Ravi".into(),
        room: "110".into(),
        details: RequestDetails::Leave(LeaveDetails {
            leave_from: "2026-05-01".into(),
            leave_to: "2026-05-04".into(),
            purpose: "Home".into(),
            destination: "Pune".into(),
            emergency_contact: "9800000005".into(),
        }),
        status: RequestStatus::Approved,
        submitted_at: chrono::Utc::now(),
        decided_at: Some(chrono::Utc::now()),
        decided_by: Some("warden".into()),
        rejection_reason: None,
        issued_pass_id: Some("L-42".into()),
        pass_token: None,
    }
}

mod delivery_tests {
    use super::*;

    #[tokio::test]
    async fn test_event_is_posted_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("x-hostel-event", "request_approved"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(vec![], None);
        let event = WebhookEvent::request_approved(&approved_request(), "L-42");
        notifier
            .send(&format!("{}/hook", server.uri()), &event)
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["event_type"], "request_approved");
        assert_eq!(body["subject_id"], "12");
        assert_eq!(body["details"]["pass_id"], "L-42");
    }

    #[tokio::test]
    async fn test_body_is_signed_when_secret_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(|req: &wiremock::Request| {
                let Some(sig) = req
                    .headers
                    .get("x-hostel-signature")
                    .and_then(|v| v.to_str().ok())
                else {
                    return false;
                };
                let mut mac = Hmac::<Sha256>::new_from_slice(b"hook-secret").unwrap();
                mac.update(&req.body);
                sig == format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
            })
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(vec![], Some("hook-secret".into()));
        let event = WebhookEvent::request_rejected(&approved_request());
        notifier.send(&server.uri(), &event).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_signature_without_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(|req: &wiremock::Request| !req.headers.contains_key("x-hostel-signature"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(vec![], None);
        let event = WebhookEvent::request_approved(&approved_request(), "L-42");
        notifier.send(&server.uri(), &event).await.unwrap();
    }
}

mod retry_tests {
    use super::*;

    #[tokio::test]
    async fn test_retries_after_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(vec![], None).with_backoff(vec![0, 0]);
        let event = WebhookEvent::request_approved(&approved_request(), "L-42");
        notifier.send(&server.uri(), &event).await.unwrap();
    }

    #[tokio::test]
    async fn test_gives_up_after_every_attempt_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(vec![], None).with_backoff(vec![0, 0, 0]);
        let event = WebhookEvent::request_approved(&approved_request(), "L-42");
        let err = notifier.send(&server.uri(), &event).await.unwrap_err();
        assert!(err.to_string().contains("after 3 attempts"));
    }
}

mod dispatch_tests {
    use super::*;
    use chrono::Utc;
    use hostel::api::admin::requests::approve_request;
    use hostel::config::Config;
    use hostel::store::memory::MemoryStore;
    use hostel::AppState;

    #[tokio::test]
    async fn test_approval_notifies_configured_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/decisions"))
            .and(header("x-hostel-event", "request_approved"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config {
            pass_secret: "dispatch-secret".into(),
            webhook_urls: vec![format!("{}/decisions", server.uri())],
            ..Config::default()
        };
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        let request = state
            .workflow
            .submit("12", "Ravi", "110", approved_request().details)
            .await
            .unwrap();
        approve_request(&state, RequestKind::Leave, &request.request_id, "warden", Utc::now())
            .await
            .unwrap();

        // delivery runs on a spawned task
        for _ in 0..50 {
            if !server.received_requests().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["details"]["request_id"], request.request_id.as_str());
    }
}
