use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::complaint::ComplaintStatus;
use crate::state::AppState;

/// GET /api/admin/complaints: pending first, then by priority.
pub async fn list_complaints(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let complaints = state.repo.list_complaints().await?;
    let pending = complaints
        .iter()
        .filter(|c| c.status == ComplaintStatus::Pending)
        .count();
    Ok(Json(json!({ "success": true, "pending": pending, "complaints": complaints })))
}

pub async fn resolve_complaint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.repo.resolve_complaint(&id, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}
