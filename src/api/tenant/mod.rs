//! Tenant portal, mounted under `/api/tenant` behind a tenant session.
//! Every handler acts on the tenant named by the session, never on an id
//! from the request.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::errors::AppError;
use crate::insights;
use crate::models::attendance::MealAttendance;
use crate::models::complaint::{ComplaintStatus, Priority};
use crate::models::fee::FeeStatus;
use crate::models::message::Party;
use crate::models::request::RequestKind;
use crate::repo::parse_date;
use crate::state::AppState;

pub mod chat;
pub mod messages;
pub mod requests;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(profile))
        .route("/dashboard", get(dashboard))
        .route("/password", post(change_password))
        .route("/room", get(room))
        .route("/mess/menu", get(mess_menu))
        .route(
            "/mess/attendance",
            get(mess_attendance).post(save_mess_attendance),
        )
        .route("/complaints", get(list_complaints).post(submit_complaint))
        .route("/fees", get(fees))
        // Messages
        .route("/messages", post(messages::send))
        .route("/messages/inbox", get(messages::inbox))
        .route("/messages/sent", get(messages::sent))
        .route(
            "/messages/conversation",
            get(messages::conversation).delete(messages::delete_conversation),
        )
        .route("/messages/:id/reply", post(messages::reply))
        .route(
            "/messages/:id",
            get(messages::view).delete(messages::delete),
        )
        // Requests & passes
        .route(
            "/leave-requests",
            get(requests::list_leave).post(requests::submit_leave),
        )
        .route(
            "/visitor-requests",
            get(requests::list_visitor).post(requests::submit_visitor),
        )
        .route("/passes/me", get(requests::my_passes))
        .route("/passes/verify", post(requests::verify_pass))
        // Assistant
        .route("/chat", post(chat::chat))
        .route("/chat/quick-action", post(chat::quick_action))
}

#[derive(Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct MessSelection {
    pub date: Option<String>,
    #[serde(flatten)]
    pub meals: MealAttendance,
}

#[derive(Deserialize)]
pub struct DateParams {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct NewComplaint {
    pub description: String,
    pub complaint_type: String,
    /// Estimated from the description when omitted.
    pub priority: Option<Priority>,
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let tenant = state.repo.tenant(identity.tenant_id()?).await?;
    Ok(Json(json!({ "success": true, "tenant": tenant })))
}

/// GET /api/tenant/dashboard: profile plus everything outstanding.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let id = identity.tenant_id()?;
    let tenant = state.repo.tenant(id).await?;
    let fees = state.repo.fees_for_student(id).await?;
    let complaints = state.repo.complaints_for_tenant(id).await?;
    let unread = state.repo.count_unread(&identity.subject, Party::Student).await?;

    let mut pending_requests = 0;
    for kind in [RequestKind::Leave, RequestKind::Visitor] {
        pending_requests += state
            .workflow
            .list_for_subject(kind, &identity.subject)
            .await?
            .iter()
            .filter(|r| r.is_pending())
            .count();
    }

    Ok(Json(json!({
        "success": true,
        "tenant": tenant,
        "pending_fees": fees.iter().filter(|f| f.status != FeeStatus::Paid).count(),
        "pending_complaints": complaints.iter().filter(|c| c.status == ComplaintStatus::Pending).count(),
        "unread_messages": unread,
        "pending_requests": pending_requests,
    })))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<PasswordChange>,
) -> Result<Json<Value>, AppError> {
    let id = identity.tenant_id()?;
    if !state
        .repo
        .verify_tenant_login(id, &payload.current_password)
        .await?
    {
        return Err(AppError::Unauthorized);
    }
    state
        .repo
        .change_tenant_password(id, &payload.new_password)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/tenant/room: the tenant's room and roommates.
pub async fn room(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let tenant = state.repo.tenant(identity.tenant_id()?).await?;
    if tenant.room.is_empty() {
        return Ok(Json(json!({ "success": true, "room": null, "roommates": [] })));
    }
    let room = state.repo.get_room(&tenant.room).await?;
    let occupants = state.repo.tenants_in_room(&tenant.room).await?;
    let roommates = insights::rank_roommates(&tenant, &occupants);
    Ok(Json(json!({ "success": true, "room": room, "roommates": roommates })))
}

pub async fn mess_menu(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let menu = state.repo.get_menu().await?;
    Ok(Json(json!({ "success": true, "menu": menu })))
}

pub async fn mess_attendance(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<DateParams>,
) -> Result<Json<Value>, AppError> {
    let date = match params.date.as_deref() {
        Some(d) => parse_date(d)?,
        None => Utc::now().date_naive(),
    };
    let day = state.repo.mess_day(date).await?;
    let meals = day.get(&identity.subject).copied().unwrap_or_default();
    Ok(Json(json!({ "success": true, "date": date.to_string(), "attendance": meals })))
}

/// POST /api/tenant/mess/attendance: opt in to meals, today by default.
pub async fn save_mess_attendance(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<MessSelection>,
) -> Result<Json<Value>, AppError> {
    let date = match payload.date.as_deref() {
        Some(d) => parse_date(d)?,
        None => Utc::now().date_naive(),
    };
    state
        .repo
        .save_mess_attendance(identity.tenant_id()?, payload.meals, date)
        .await?;
    Ok(Json(json!({ "success": true, "date": date.to_string(), "attendance": payload.meals })))
}

pub async fn list_complaints(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let complaints = state
        .repo
        .complaints_for_tenant(identity.tenant_id()?)
        .await?;
    Ok(Json(json!({ "success": true, "complaints": complaints })))
}

pub async fn submit_complaint(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<NewComplaint>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let priority = payload.priority.unwrap_or_else(|| {
        insights::complaint_priority(&payload.description, &payload.complaint_type)
    });
    let complaint = state
        .repo
        .submit_complaint(
            identity.tenant_id()?,
            &payload.description,
            &payload.complaint_type,
            priority,
            Utc::now(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "complaint": complaint })),
    ))
}

pub async fn fees(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let fees = state.repo.fees_for_student(identity.tenant_id()?).await?;
    let outstanding: f64 = fees
        .iter()
        .map(|f| (f.amount - f.paid_amount).max(0.0))
        .sum();
    Ok(Json(json!({ "success": true, "outstanding": outstanding, "fees": fees })))
}
