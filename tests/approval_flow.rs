//! Decision races and pass verification across the workflow, issuer and
//! approval helpers.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use hostel::api::admin::requests::{approve_request, reject_request};
use hostel::config::Config;
use hostel::errors::AppError;
use hostel::models::request::{LeaveDetails, RequestDetails, RequestKind, RequestStatus, VisitorDetails};
use hostel::store::memory::MemoryStore;
use hostel::store::{Document, DocumentStore, MergeOutcome, Query, StoreError};
use hostel::workflow::Outcome;
use hostel::AppState;

fn state() -> Arc<AppState> {
    let config = Config {
        pass_secret: "approval-flow-secret".into(),
        ..Config::default()
    };
    Arc::new(AppState::new(Arc::new(MemoryStore::new()), config))
}

fn leave(from: &str, to: &str) -> RequestDetails {
    RequestDetails::Leave(LeaveDetails {
        leave_from: from.into(),
        leave_to: to.into(),
        purpose: "Exams over".into(),
        destination: "Nagpur".into(),
        emergency_contact: "9800000003".into(),
    })
}

mod race_tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_decisions_only_one_wins() {
        let state = state();
        let request = state
            .workflow
            .submit("7", "Dev", "305", leave("2099-06-01", "2099-06-10"))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let state = state.clone();
            let id = request.request_id.clone();
            handles.push(tokio::spawn(async move {
                let outcome = if i % 2 == 0 {
                    Outcome::Approve
                } else {
                    Outcome::Reject { reason: Some("Clash".into()) }
                };
                state
                    .workflow
                    .decide_at(RequestKind::Leave, &id, &format!("admin{i}"), outcome, Utc::now())
                    .await
            }));
        }

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(AppError::AlreadyDecided { .. }) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);

        let stored = state
            .workflow
            .get(RequestKind::Leave, &request.request_id)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.status, RequestStatus::Pending);
        assert!(state.workflow.list_pending(RequestKind::Leave).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_request_cannot_be_approved() {
        let state = state();
        let request = state
            .workflow
            .submit("7", "Dev", "305", leave("2099-06-01", "2099-06-10"))
            .await
            .unwrap();

        let rejected = reject_request(&state, RequestKind::Leave, &request.request_id, "warden", None, Utc::now())
            .await
            .unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("No reason provided"));

        let err = approve_request(&state, RequestKind::Leave, &request.request_id, "warden", Utc::now())
            .await
            .unwrap_err();
        match err {
            AppError::AlreadyDecided { status, .. } => assert_eq!(status, "Rejected"),
            other => panic!("expected AlreadyDecided, got {other:?}"),
        }
    }
}

mod pass_tests {
    use super::*;

    #[tokio::test]
    async fn test_leave_pass_expires_after_leave_to() {
        let state = state();
        let request = state
            .workflow
            .submit("7", "Dev", "305", leave("2026-01-01", "2026-01-03"))
            .await
            .unwrap();
        let approved_at = Utc.with_ymd_and_hms(2025, 12, 30, 10, 0, 0).unwrap();
        let approved = approve_request(&state, RequestKind::Leave, &request.request_id, "warden", approved_at)
            .await
            .unwrap();
        assert_eq!(approved.request.pass_token.as_deref(), Some(approved.pass_token.as_str()));

        let during = Utc.with_ymd_and_hms(2026, 1, 3, 20, 0, 0).unwrap();
        assert!(state.passes.verify(&approved.pass_token, during).valid);

        let after = Utc.with_ymd_and_hms(2026, 1, 4, 0, 0, 1).unwrap();
        let verdict = state.passes.verify(&approved.pass_token, after);
        assert!(!verdict.valid);
        assert_eq!(verdict.error.as_deref(), Some("pass expired"));
        let fields = verdict.fields.unwrap();
        assert_eq!(fields.pass_id, approved.pass_id);
        assert_eq!(fields.approved_by.as_deref(), Some("warden"));
    }

    #[tokio::test]
    async fn test_visitor_pass_window_uses_visit_date() {
        let state = state();
        let request = state
            .workflow
            .submit(
                "7",
                "Dev",
                "305",
                RequestDetails::Visitor(VisitorDetails {
                    visitor_name: "Meera".into(),
                    visitor_phone: "9800000004".into(),
                    visit_date: "2026-02-14".into(),
                    entry_time: "10:00".into(),
                    purpose: "Lunch".into(),
                    valid_until: "17:30".into(),
                }),
            )
            .await
            .unwrap();
        let approved = approve_request(&state, RequestKind::Visitor, &request.request_id, "warden", Utc::now())
            .await
            .unwrap();
        assert!(approved.pass_id.starts_with("V-"));

        let visit = Utc.with_ymd_and_hms(2026, 2, 14, 17, 0, 0).unwrap();
        assert!(state.passes.verify(&approved.pass_token, visit).valid);
        assert!(!state
            .passes
            .verify(&approved.pass_token, visit + Duration::hours(1))
            .valid);
    }

    #[tokio::test]
    async fn test_tampered_or_foreign_token_fails() {
        let state = state();
        let request = state
            .workflow
            .submit("7", "Dev", "305", leave("2099-06-01", "2099-06-10"))
            .await
            .unwrap();
        let approved = approve_request(&state, RequestKind::Leave, &request.request_id, "warden", Utc::now())
            .await
            .unwrap();

        let mut tampered = approved.pass_token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        let verdict = state.passes.verify(&tampered, Utc::now());
        assert!(!verdict.valid);
        assert!(verdict.fields.is_none());

        let other = AppState::new(
            Arc::new(MemoryStore::new()),
            Config {
                pass_secret: "some-other-secret".into(),
                ..Config::default()
            },
        );
        let verdict = other.passes.verify(&approved.pass_token, Utc::now());
        assert!(!verdict.valid);
        assert_eq!(verdict.error.as_deref(), Some("pass signature mismatch"));
    }
}

mod store_failure_tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    /// Memory store whose unconditional merge always fails.
    struct BrokenMerge(MemoryStore);

    #[async_trait]
    impl DocumentStore for BrokenMerge {
        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
            self.0.get(collection, id).await
        }

        async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
            self.0.set(collection, id, doc).await
        }

        async fn merge(&self, collection: &str, _id: &str, _patch: Document) -> Result<bool, StoreError> {
            Err(StoreError::NotAnObject {
                collection: collection.to_string(),
            })
        }

        async fn merge_if(
            &self,
            collection: &str,
            id: &str,
            field: &str,
            expected: &Value,
            patch: Document,
        ) -> Result<MergeOutcome, StoreError> {
            self.0.merge_if(collection, id, field, expected, patch).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
            self.0.delete(collection, id).await
        }

        async fn query(
            &self,
            collection: &str,
            query: &Query,
        ) -> Result<Vec<(String, Document)>, StoreError> {
            self.0.query(collection, query).await
        }
    }

    #[tokio::test]
    async fn test_approval_stores_token_in_the_decision_write() {
        let config = Config {
            pass_secret: "approval-flow-secret".into(),
            ..Config::default()
        };
        let state = AppState::new(Arc::new(BrokenMerge(MemoryStore::new())), config);
        let request = state
            .workflow
            .submit("7", "Dev", "305", leave("2099-06-01", "2099-06-10"))
            .await
            .unwrap();

        let approved = approve_request(&state, RequestKind::Leave, &request.request_id, "warden", Utc::now())
            .await
            .unwrap();

        let stored = state
            .workflow
            .get(RequestKind::Leave, &request.request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);
        assert_eq!(stored.issued_pass_id.as_deref(), Some(approved.pass_id.as_str()));
        assert_eq!(stored.pass_token.as_deref(), Some(approved.pass_token.as_str()));
        assert!(state.passes.verify(&approved.pass_token, Utc::now()).valid);
    }
}
