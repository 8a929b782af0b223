//! Office inbox. Every admin reads and writes as the shared desk.

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
use crate::models::message::Party;
use crate::repo::ADMIN_DESK;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct Compose {
    /// Tenant id, or `"all"` to broadcast.
    pub receiver_id: String,
    pub subject: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct Reply {
    pub message: String,
}

pub async fn compose(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Compose>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let now = Utc::now();
    let receiver = payload.receiver_id.trim();

    if receiver.eq_ignore_ascii_case("all") {
        let sent = state
            .repo
            .broadcast(ADMIN_DESK, &payload.subject, &payload.message, now)
            .await?;
        return Ok((
            StatusCode::CREATED,
            Json(json!({ "success": true, "recipients": sent })),
        ));
    }

    let tenant_id: i64 = receiver
        .parse()
        .map_err(|_| AppError::validation(format!("invalid receiver '{receiver}'")))?;
    let tenant = state.repo.tenant(tenant_id).await?;
    let message = state
        .repo
        .send_message(
            ADMIN_DESK,
            Party::Admin,
            &tenant.id.to_string(),
            Party::Student,
            &payload.subject,
            &payload.message,
            now,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "recipients": 1, "message": message })),
    ))
}

pub async fn inbox(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let messages = state.repo.inbox(ADMIN_DESK, Party::Admin).await?;
    let unread = messages.iter().filter(|m| !m.read).count();
    Ok(Json(json!({ "success": true, "unread": unread, "messages": messages })))
}

pub async fn sent(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let messages = state.repo.sent(ADMIN_DESK, Party::Admin).await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}

/// GET /api/admin/messages/:id. Opening a message addressed to the desk
/// marks it read.
pub async fn view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut message = state
        .repo
        .get_message(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("message {id}")))?;

    if message.receiver_type == Party::Admin && !message.read {
        state.repo.mark_read(&id).await?;
        message.read = true;
    }
    Ok(Json(json!({ "success": true, "message": message })))
}

pub async fn reply(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<Reply>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let original = state
        .repo
        .get_message(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("message {id}")))?;

    let subject = if original.subject.starts_with("Re: ") {
        original.subject.clone()
    } else {
        format!("Re: {}", original.subject)
    };
    let message = state
        .repo
        .send_message(
            ADMIN_DESK,
            Party::Admin,
            original.student_id(),
            Party::Student,
            &subject,
            &payload.message,
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": message }))))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.repo.delete_message(&id).await? {
        return Err(AppError::not_found(format!("message {id}")));
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn conversations(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let threads = state.repo.conversations().await?;
    Ok(Json(json!({ "success": true, "conversations": threads })))
}

pub async fn conversation(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let messages = state.repo.conversation(&student_id).await?;
    Ok(Json(json!({ "success": true, "student_id": student_id, "messages": messages })))
}

pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = state.repo.delete_conversation(&student_id).await?;
    tracing::info!(student_id = %student_id, removed, "conversation deleted");
    Ok(Json(json!({ "success": true, "deleted": removed })))
}
