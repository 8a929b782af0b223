//! Leave and visitor request lifecycle.
//!
//! A request is created Pending by its tenant and decided exactly once by an
//! admin. The decision is a compare-and-set on `status`, so a second or
//! concurrent decision on the same request fails with
//! [`AppError::AlreadyDecided`] and leaves the stored record untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::errors::AppError;
use crate::metrics;
use crate::models::request::{Request, RequestDetails, RequestKind, RequestStatus};
use crate::store::{from_document, to_document, Document, DocumentStore, MergeOutcome, Query};

pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Approve,
    Reject { reason: Option<String> },
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Approve => "approved",
            Outcome::Reject { .. } => "rejected",
        }
    }
}

/// Result of a successful decision. `pass_id` is set only on approval.
#[derive(Debug, Clone)]
pub struct Decision {
    pub request: Request,
    pub pass_id: Option<String>,
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    store: Arc<dyn DocumentStore>,
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

fn describe(kind: RequestKind, request_id: &str) -> String {
    format!("{} request {request_id}", kind.as_str())
}

impl ApprovalWorkflow {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn submit(
        &self,
        subject_id: &str,
        subject_name: &str,
        room: &str,
        details: RequestDetails,
    ) -> Result<Request, AppError> {
        self.submit_at(subject_id, subject_name, room, details, Utc::now())
            .await
    }

    /// Persist a new Pending request. All type-specific fields must be
    /// non-empty; their contents are stored as given.
    pub async fn submit_at(
        &self,
        subject_id: &str,
        subject_name: &str,
        room: &str,
        details: RequestDetails,
        now: DateTime<Utc>,
    ) -> Result<Request, AppError> {
        let mut missing = Vec::new();
        if subject_id.trim().is_empty() {
            missing.push("subject_id");
        }
        if subject_name.trim().is_empty() {
            missing.push("subject_name");
        }
        missing.extend(details.missing_fields());
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let kind = details.kind();
        let request = Request {
            request_id: new_id(kind.request_prefix()),
            kind,
            subject_id: subject_id.trim().to_string(),
            subject_name: subject_name.trim().to_string(),
            room: room.trim().to_string(),
            details,
            status: RequestStatus::Pending,
            submitted_at: now,
            decided_at: None,
            decided_by: None,
            rejection_reason: None,
            issued_pass_id: None,
            pass_token: None,
        };

        self.store
            .set(kind.collection(), &request.request_id, to_document(&request)?)
            .await?;

        metrics::record_request_submitted(kind);
        tracing::info!(
            request_id = %request.request_id,
            kind = kind.as_str(),
            subject = %request.subject_id,
            "request submitted"
        );
        Ok(request)
    }

    pub async fn get(&self, kind: RequestKind, request_id: &str) -> Result<Option<Request>, AppError> {
        match self.store.get(kind.collection(), request_id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn load(&self, kind: RequestKind, query: &Query) -> Result<Vec<Request>, AppError> {
        let mut requests = self
            .store
            .query(kind.collection(), query)
            .await?
            .into_iter()
            .map(|(_, doc)| from_document::<Request>(doc))
            .collect::<Result<Vec<_>, _>>()?;
        requests.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.request_id.cmp(&b.request_id))
        });
        Ok(requests)
    }

    /// Pending requests, newest submission first.
    pub async fn list_pending(&self, kind: RequestKind) -> Result<Vec<Request>, AppError> {
        self.load(kind, &Query::new().eq("status", RequestStatus::Pending.as_str()))
            .await
    }

    /// Every request of this kind, newest first.
    pub async fn list_all(&self, kind: RequestKind) -> Result<Vec<Request>, AppError> {
        self.load(kind, &Query::new()).await
    }

    pub async fn list_for_subject(
        &self,
        kind: RequestKind,
        subject_id: &str,
    ) -> Result<Vec<Request>, AppError> {
        self.load(kind, &Query::new().eq("subject_id", subject_id))
            .await
    }

    pub async fn decide(
        &self,
        kind: RequestKind,
        request_id: &str,
        admin_id: &str,
        outcome: Outcome,
    ) -> Result<Decision, AppError> {
        self.decide_at(kind, request_id, admin_id, outcome, Utc::now())
            .await
    }

    /// Move a Pending request to Approved or Rejected.
    ///
    /// Approval mints a pass id and records it on the request. Rejection
    /// records the reason, or [`DEFAULT_REJECTION_REASON`].
    pub async fn decide_at(
        &self,
        kind: RequestKind,
        request_id: &str,
        admin_id: &str,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<Decision, AppError> {
        self.decide_with(kind, request_id, admin_id, outcome, now, |_, _| Ok(None))
            .await
    }

    /// Like [`decide_at`](Self::decide_at), but on approval `mint` is called
    /// with the pending request and its new pass id before anything is
    /// written. A token it returns is stored as `pass_token` in the same
    /// conditional write as the status change; an error from it leaves the
    /// request Pending.
    pub async fn decide_with<F>(
        &self,
        kind: RequestKind,
        request_id: &str,
        admin_id: &str,
        outcome: Outcome,
        now: DateTime<Utc>,
        mint: F,
    ) -> Result<Decision, AppError>
    where
        F: FnOnce(&Request, &str) -> Result<Option<String>, AppError>,
    {
        if admin_id.trim().is_empty() {
            return Err(AppError::Unauthorized);
        }

        let current = self
            .get(kind, request_id)
            .await?
            .ok_or_else(|| AppError::not_found(describe(kind, request_id)))?;
        if !current.is_pending() {
            return Err(self.already_decided(request_id, current.status.as_str(), admin_id));
        }

        let mut patch = Document::new();
        patch.insert("decided_at".into(), json!(now));
        patch.insert("decided_by".into(), json!(admin_id));

        let pass_id = match &outcome {
            Outcome::Approve => {
                let pass_id = new_id(kind.pass_prefix());
                if let Some(token) = mint(&current, &pass_id)? {
                    patch.insert("pass_token".into(), json!(token));
                }
                patch.insert("status".into(), json!(RequestStatus::Approved));
                patch.insert("issued_pass_id".into(), json!(pass_id));
                Some(pass_id)
            }
            Outcome::Reject { reason } => {
                let reason = reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(DEFAULT_REJECTION_REASON);
                patch.insert("status".into(), json!(RequestStatus::Rejected));
                patch.insert("rejection_reason".into(), json!(reason));
                None
            }
        };

        let pending = json!(RequestStatus::Pending);
        match self
            .store
            .merge_if(kind.collection(), request_id, "status", &pending, patch)
            .await?
        {
            MergeOutcome::Applied => {}
            MergeOutcome::Missing => {
                return Err(AppError::not_found(describe(kind, request_id)));
            }
            MergeOutcome::Mismatch => {
                let status = self
                    .get(kind, request_id)
                    .await?
                    .map(|r| r.status.as_str().to_string())
                    .unwrap_or_else(|| "decided".to_string());
                return Err(self.already_decided(request_id, &status, admin_id));
            }
        }

        let request = self
            .get(kind, request_id)
            .await?
            .ok_or_else(|| AppError::not_found(describe(kind, request_id)))?;

        metrics::record_request_decided(kind, outcome.label());
        tracing::info!(
            request_id = %request_id,
            kind = kind.as_str(),
            admin = %admin_id,
            outcome = outcome.label(),
            pass_id = pass_id.as_deref().unwrap_or(""),
            "request decided"
        );
        Ok(Decision { request, pass_id })
    }

    fn already_decided(&self, request_id: &str, status: &str, admin_id: &str) -> AppError {
        tracing::warn!(
            request_id = %request_id,
            status = %status,
            admin = %admin_id,
            "decision on a request that is no longer pending"
        );
        AppError::AlreadyDecided {
            request_id: request_id.to_string(),
            status: status.to_string(),
        }
    }
}
