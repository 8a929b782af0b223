//! Leave and visitor approvals. Both kinds share these handlers; the router
//! is built once per kind.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::request::{Request, RequestKind};
use crate::notification::webhook::WebhookEvent;
use crate::pass::{PassFields, PassKind};
use crate::state::AppState;
use crate::workflow::Outcome;

type AppStateRef = State<Arc<AppState>>;

pub fn router(kind: RequestKind) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(move |state: AppStateRef| list_all(state, kind)))
        .route(
            "/pending",
            get(move |state: AppStateRef| list_pending(state, kind)),
        )
        .route(
            "/:id",
            get(move |state: AppStateRef, path: Path<String>| get_request(state, path, kind)),
        )
        .route(
            "/:id/approve",
            post(
                move |state: AppStateRef, identity: Extension<Identity>, path: Path<String>| {
                    approve(state, identity, path, kind)
                },
            ),
        )
        .route(
            "/:id/reject",
            post(
                move |state: AppStateRef,
                      identity: Extension<Identity>,
                      path: Path<String>,
                      body: Option<Json<RejectBody>>| {
                    reject(state, identity, path, body, kind)
                },
            ),
        )
}

#[derive(Deserialize)]
pub struct RejectBody {
    pub reason: Option<String>,
}

/// Result of approving a request and signing its pass.
#[derive(Debug, Serialize)]
pub struct ApprovedPass {
    pub request: Request,
    pub pass_id: String,
    pub pass_token: String,
}

/// Approve, sign the pass and notify webhook subscribers. The token is
/// signed before the decision is committed and stored in the same write.
pub async fn approve_request(
    state: &AppState,
    kind: RequestKind,
    request_id: &str,
    admin: &str,
    now: DateTime<Utc>,
) -> Result<ApprovedPass, AppError> {
    let decision = state
        .workflow
        .decide_with(kind, request_id, admin, Outcome::Approve, now, |pending, pass_id| {
            let fields = PassFields::for_request(pending, pass_id, admin, now);
            state.passes.issue(PassKind::from(kind), &fields).map(Some)
        })
        .await?;
    let pass_id = decision
        .pass_id
        .ok_or_else(|| anyhow::anyhow!("approval of {request_id} produced no pass id"))?;
    let request = decision.request;
    let pass_token = request
        .pass_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("approval of {request_id} stored no pass token"))?;

    state
        .webhook
        .dispatch(WebhookEvent::request_approved(&request, &pass_id));

    Ok(ApprovedPass {
        request,
        pass_id,
        pass_token,
    })
}

pub async fn reject_request(
    state: &AppState,
    kind: RequestKind,
    request_id: &str,
    admin: &str,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Request, AppError> {
    let decision = state
        .workflow
        .decide_at(kind, request_id, admin, Outcome::Reject { reason }, now)
        .await?;
    state
        .webhook
        .dispatch(WebhookEvent::request_rejected(&decision.request));
    Ok(decision.request)
}

// ── Handlers ─────────────────────────────────────────────────

async fn list_all(
    State(state): State<Arc<AppState>>,
    kind: RequestKind,
) -> Result<Json<Value>, AppError> {
    let requests = state.workflow.list_all(kind).await?;
    Ok(Json(json!({ "success": true, "count": requests.len(), "requests": requests })))
}

async fn list_pending(
    State(state): State<Arc<AppState>>,
    kind: RequestKind,
) -> Result<Json<Value>, AppError> {
    let requests = state.workflow.list_pending(kind).await?;
    Ok(Json(json!({ "success": true, "count": requests.len(), "requests": requests })))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    kind: RequestKind,
) -> Result<Json<Value>, AppError> {
    let request = state
        .workflow
        .get(kind, &id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} request {id}", kind.as_str())))?;
    Ok(Json(json!({ "success": true, "request": request })))
}

async fn approve(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    kind: RequestKind,
) -> Result<Json<Value>, AppError> {
    let approved = approve_request(&state, kind, &id, &identity.subject, Utc::now()).await?;
    Ok(Json(json!({
        "success": true,
        "detail": approved.pass_id,
        "pass_id": approved.pass_id,
        "pass_token": approved.pass_token,
        "request": approved.request,
    })))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    body: Option<Json<RejectBody>>,
    kind: RequestKind,
) -> Result<Json<Value>, AppError> {
    let reason = body.and_then(|Json(b)| b.reason);
    let request = reject_request(&state, kind, &id, &identity.subject, reason, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "request": request })))
}
