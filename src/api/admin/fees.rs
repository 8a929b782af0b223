use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::fee::Payment;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NewFee {
    pub student_id: i64,
    pub amount: f64,
    pub due_date: String,
    pub fee_type: String,
}

pub async fn add_fee(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewFee>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let fee = state
        .repo
        .add_fee(
            payload.student_id,
            payload.amount,
            &payload.due_date,
            &payload.fee_type,
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "fee": fee }))))
}

pub async fn list_fees(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let fees = state.repo.list_fees().await?;
    Ok(Json(json!({ "success": true, "count": fees.len(), "fees": fees })))
}

pub async fn get_fee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let fee = state
        .repo
        .get_fee(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("fee {id}")))?;
    Ok(Json(json!({ "success": true, "fee": fee })))
}

/// POST /api/admin/fees/:id/pay
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payment): Json<Payment>,
) -> Result<Json<Value>, AppError> {
    let fee = state.repo.record_payment(&id, payment, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "fee": fee })))
}

/// GET /api/admin/fees/student/:id: payment history for one tenant.
pub async fn student_fees(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let student = state.repo.tenant(student_id).await?;
    let fees = state.repo.fees_for_student(student_id).await?;
    let outstanding: f64 = fees.iter().map(|f| (f.amount - f.paid_amount).max(0.0)).sum();
    Ok(Json(json!({
        "success": true,
        "student_name": student.name,
        "outstanding": outstanding,
        "fees": fees,
    })))
}
