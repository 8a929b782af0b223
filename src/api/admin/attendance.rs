use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::attendance::{AttendanceStatus, MealAttendance, WeekMenu};
use crate::repo::parse_date;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DateParams {
    pub date: Option<String>,
}

impl DateParams {
    /// Requested date, or today.
    fn date_or_today(&self) -> String {
        self.date
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| Utc::now().date_naive().to_string())
    }
}

#[derive(Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Deserialize)]
pub struct PoorParams {
    pub days: Option<i64>,
    pub threshold: Option<f64>,
}

#[derive(Deserialize)]
pub struct AttendanceMark {
    pub tenant_id: i64,
    pub status: AttendanceStatus,
}

#[derive(Deserialize)]
pub struct MarkAttendance {
    pub date: Option<String>,
    pub records: Vec<AttendanceMark>,
}

/// POST /api/admin/attendance: mark several tenants for one day.
pub async fn mark_attendance(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MarkAttendance>,
) -> Result<Json<Value>, AppError> {
    if payload.records.is_empty() {
        return Err(AppError::validation("no attendance records supplied"));
    }
    let date = DateParams { date: payload.date }.date_or_today();
    let now = Utc::now();

    let mut marked = Vec::with_capacity(payload.records.len());
    for mark in payload.records {
        marked.push(
            state
                .repo
                .mark_attendance(mark.tenant_id, &date, mark.status, now)
                .await?,
        );
    }
    tracing::info!(date = %date, count = marked.len(), "attendance marked");
    Ok(Json(json!({ "success": true, "date": date, "marked": marked.len(), "records": marked })))
}

pub async fn attendance_on(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Result<Json<Value>, AppError> {
    let date = params.date_or_today();
    let records = state.repo.attendance_on(&date).await?;
    Ok(Json(json!({ "success": true, "date": date, "records": records })))
}

pub async fn attendance_range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Value>, AppError> {
    let records = state
        .repo
        .attendance_between(params.from.as_deref(), params.to.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "count": records.len(), "records": records })))
}

pub async fn attendance_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Result<Json<Value>, AppError> {
    let stats = state.repo.attendance_stats(&params.date_or_today()).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// GET /api/admin/attendance/poor?days=30&threshold=70
pub async fn poor_attendance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PoorParams>,
) -> Result<Json<Value>, AppError> {
    let days = params.days.unwrap_or(30);
    let threshold = params.threshold.unwrap_or(70.0);
    if days < 1 {
        return Err(AppError::validation("days must be at least 1"));
    }
    let students = state
        .repo
        .poor_attendance(Utc::now().date_naive(), days, threshold)
        .await?;
    Ok(Json(json!({ "success": true, "students": students })))
}

// ── Mess ─────────────────────────────────────────────────────

pub async fn mess_attendance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&params.date_or_today())?;
    let entries = state.repo.mess_attendance_on(date).await?;
    let count = |meal: fn(&MealAttendance) -> bool| {
        entries.iter().filter(|e| meal(&e.attendance)).count()
    };
    Ok(Json(json!({
        "success": true,
        "date": date.to_string(),
        "breakfast": count(|m| m.breakfast),
        "lunch": count(|m| m.lunch),
        "dinner": count(|m| m.dinner),
        "entries": entries,
    })))
}

pub async fn get_menu(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let menu = state.repo.get_menu().await?;
    Ok(Json(json!({ "success": true, "menu": menu })))
}

pub async fn save_menu(
    State(state): State<Arc<AppState>>,
    Json(menu): Json<WeekMenu>,
) -> Result<Json<Value>, AppError> {
    state.repo.save_menu(&menu).await?;
    Ok(Json(json!({ "success": true, "menu": menu })))
}
