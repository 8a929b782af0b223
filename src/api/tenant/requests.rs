use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::request::{
    LeaveDetails, RequestDetails, RequestKind, RequestStatus, VisitorDetails,
};
use crate::pass::{PassFields, PassKind};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

async fn submit(
    state: &AppState,
    identity: &Identity,
    details: RequestDetails,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let tenant = state.repo.tenant(identity.tenant_id()?).await?;
    let request = state
        .workflow
        .submit(&identity.subject, &tenant.name, &tenant.room, details)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "request_id": request.request_id, "request": request })),
    ))
}

async fn history(
    state: &AppState,
    identity: &Identity,
    kind: RequestKind,
) -> Result<Json<Value>, AppError> {
    let requests = state
        .workflow
        .list_for_subject(kind, &identity.subject)
        .await?;
    Ok(Json(json!({ "success": true, "requests": requests })))
}

pub async fn submit_leave(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(details): Json<LeaveDetails>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    submit(&state, &identity, RequestDetails::Leave(details)).await
}

pub async fn submit_visitor(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(details): Json<VisitorDetails>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    submit(&state, &identity, RequestDetails::Visitor(details)).await
}

pub async fn list_leave(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    history(&state, &identity, RequestKind::Leave).await
}

pub async fn list_visitor(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    history(&state, &identity, RequestKind::Visitor).await
}

/// GET /api/tenant/passes/me: a fresh student ID plus every pass issued on
/// the tenant's approved requests.
pub async fn my_passes(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let tenant = state.repo.tenant(identity.tenant_id()?).await?;
    let now = Utc::now();
    let id_fields = PassFields::student_id(&tenant, now);
    let id_token = state.passes.issue(PassKind::StudentId, &id_fields)?;

    let mut passes = Vec::new();
    for kind in [RequestKind::Leave, RequestKind::Visitor] {
        for request in state
            .workflow
            .list_for_subject(kind, &identity.subject)
            .await?
        {
            if request.status != RequestStatus::Approved {
                continue;
            }
            let Some(token) = request.pass_token else {
                continue;
            };
            let verification = state.passes.verify(&token, now);
            passes.push(json!({
                "kind": PassKind::from(kind),
                "request_id": request.request_id,
                "pass_id": request.issued_pass_id,
                "pass_token": token,
                "valid": verification.valid,
            }));
        }
    }

    Ok(Json(json!({
        "success": true,
        "student_id": { "pass": id_fields, "pass_token": id_token },
        "passes": passes,
    })))
}

pub async fn verify_pass(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyRequest>,
) -> Json<Value> {
    let verification = state.passes.verify(&payload.token, Utc::now());
    Json(json!({ "success": true, "verification": verification }))
}
