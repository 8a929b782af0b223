use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::request::RequestKind;
use crate::pass::{PassFields, PassKind};
use crate::repo::require;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct VisitorRegistration {
    /// Tenant being visited.
    pub tenant_id: i64,
    pub visitor_name: String,
    pub visitor_phone: String,
    pub purpose: String,
}

#[derive(Deserialize)]
pub struct LeavePassRequest {
    pub tenant_id: i64,
    pub leave_from: String,
    pub leave_to: String,
    pub destination: String,
    pub purpose: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

fn new_pass_id(kind: RequestKind) -> String {
    format!("{}-{}", kind.pass_prefix(), uuid::Uuid::new_v4().simple())
}

/// POST /api/admin/passes/visitor: register a walk-in visitor. The pass is
/// valid from now for the configured number of hours.
pub async fn visitor_pass(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<VisitorRegistration>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require("visitor_name", &payload.visitor_name)?;
    require("visitor_phone", &payload.visitor_phone)?;
    require("purpose", &payload.purpose)?;

    let host = state.repo.tenant(payload.tenant_id).await?;
    let now = Utc::now();
    let until = now + Duration::hours(state.config.visitor_pass_hours);

    let mut extra = BTreeMap::new();
    extra.insert("visitor_name".to_string(), payload.visitor_name.trim().to_string());
    extra.insert("visitor_phone".to_string(), payload.visitor_phone.trim().to_string());
    extra.insert("purpose".to_string(), payload.purpose.trim().to_string());

    let fields = PassFields {
        pass_id: new_pass_id(RequestKind::Visitor),
        subject_id: host.id.to_string(),
        subject_name: host.name,
        room: host.room,
        request_id: None,
        valid_from: Some(now.to_rfc3339()),
        valid_until: Some(until.to_rfc3339()),
        approved_by: Some(identity.subject),
        issued_at: now.to_rfc3339(),
        extra,
    };
    let token = state.passes.issue(PassKind::VisitorPass, &fields)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "pass": fields, "pass_token": token })),
    ))
}

/// POST /api/admin/passes/leave: leave pass issued directly by the office.
pub async fn leave_pass(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<LeavePassRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require("leave_from", &payload.leave_from)?;
    require("leave_to", &payload.leave_to)?;
    require("destination", &payload.destination)?;

    let tenant = state.repo.tenant(payload.tenant_id).await?;
    let now = Utc::now();

    let mut extra = BTreeMap::new();
    extra.insert("destination".to_string(), payload.destination.trim().to_string());
    extra.insert("purpose".to_string(), payload.purpose.trim().to_string());
    if let Some(contact) = payload.emergency_contact.filter(|c| !c.trim().is_empty()) {
        extra.insert("emergency_contact".to_string(), contact);
    }

    let fields = PassFields {
        pass_id: new_pass_id(RequestKind::Leave),
        subject_id: tenant.id.to_string(),
        subject_name: tenant.name,
        room: tenant.room,
        request_id: None,
        valid_from: Some(payload.leave_from),
        valid_until: Some(payload.leave_to),
        approved_by: Some(identity.subject),
        issued_at: now.to_rfc3339(),
        extra,
    };
    let token = state.passes.issue(PassKind::LeavePass, &fields)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "pass": fields, "pass_token": token })),
    ))
}

/// GET /api/admin/passes/student/:id: digital ID card for any tenant.
pub async fn student_id_pass(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let tenant = state.repo.tenant(id).await?;
    let fields = PassFields::student_id(&tenant, Utc::now());
    let token = state.passes.issue(PassKind::StudentId, &fields)?;
    Ok(Json(json!({ "success": true, "pass": fields, "pass_token": token })))
}

/// POST /api/admin/passes/verify. Always 200; the verdict is in the body.
pub async fn verify_pass(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyRequest>,
) -> Json<Value> {
    let verification = state.passes.verify(&payload.token, Utc::now());
    Json(json!({ "success": true, "verification": verification }))
}
