use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::insights::{self, RoomPreferences};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PriorityRequest {
    pub complaint_text: String,
    #[serde(default = "default_complaint_type")]
    pub complaint_type: String,
}

fn default_complaint_type() -> String {
    "General".to_string()
}

#[derive(Deserialize)]
pub struct TrendParams {
    pub days: Option<i64>,
}

/// POST /api/admin/insights/recommend-room
pub async fn recommend_room(
    State(state): State<Arc<AppState>>,
    Json(prefs): Json<RoomPreferences>,
) -> Result<Json<Value>, AppError> {
    if prefs.sleep_time > 23 {
        return Err(AppError::validation("sleep_time must be an hour between 0 and 23"));
    }
    let rooms = state.repo.available_rooms().await?;
    if rooms.is_empty() {
        return Ok(Json(json!({
            "success": true,
            "recommendations": [],
            "message": "No available rooms",
        })));
    }

    let mut candidates = Vec::with_capacity(rooms.len());
    for room in rooms {
        let occupants = state.repo.tenants_in_room(&room.room_no).await?;
        candidates.push((room, occupants));
    }
    let recommendations = insights::recommend_rooms(&prefs, &candidates);
    Ok(Json(json!({
        "success": true,
        "message": format!("Found {} compatible rooms", recommendations.len()),
        "recommendations": recommendations,
    })))
}

/// GET /api/admin/insights/roommates/:id
pub async fn roommates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let student = state.repo.tenant(id).await?;
    if student.room.is_empty() {
        return Ok(Json(json!({ "success": true, "roommates": [] })));
    }
    let occupants = state.repo.tenants_in_room(&student.room).await?;
    let ranked = insights::rank_roommates(&student, &occupants);
    Ok(Json(json!({ "success": true, "room": student.room, "roommates": ranked })))
}

/// GET /api/admin/insights/payment-risk/:id
pub async fn payment_risk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let student = state.repo.tenant(id).await?;
    let fees = state.repo.fees_for_student(id).await?;
    let report = insights::payment_risk(&fees, Utc::now().date_naive());
    Ok(Json(json!({
        "success": true,
        "student_id": student.id,
        "student_name": student.name,
        "report": report,
    })))
}

/// POST /api/admin/insights/complaint-priority
pub async fn complaint_priority(Json(payload): Json<PriorityRequest>) -> Result<Json<Value>, AppError> {
    if payload.complaint_text.trim().is_empty() {
        return Err(AppError::validation("complaint_text is required"));
    }
    let priority = insights::complaint_priority(&payload.complaint_text, &payload.complaint_type);
    Ok(Json(json!({ "success": true, "priority": priority })))
}

/// GET /api/admin/insights/mess-forecast: tomorrow's headcount from the
/// seven days ending today.
pub async fn mess_forecast(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let history = state.repo.mess_headcounts(tomorrow, 7).await?;
    let forecast = insights::mess_forecast(&history, tomorrow.weekday());
    Ok(Json(json!({
        "success": true,
        "date": tomorrow.to_string(),
        "forecast": forecast,
    })))
}

/// GET /api/admin/insights/attendance-trend?days=30
pub async fn attendance_trend(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendParams>,
) -> Result<Json<Value>, AppError> {
    let days = params.days.unwrap_or(30).clamp(2, 365);
    let presence = state
        .repo
        .daily_presence(Utc::now().date_naive(), days)
        .await?;
    let trend = insights::attendance_trend(&presence);
    Ok(Json(json!({ "success": true, "trend": trend })))
}
