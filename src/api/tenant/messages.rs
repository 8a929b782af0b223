use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::message::{Message, Party};
use crate::repo::ADMIN_DESK;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ToOffice {
    pub subject: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct Reply {
    pub message: String,
}

/// A tenant may only see messages on their own thread. Anything else is
/// reported as missing.
async fn own_message(state: &AppState, identity: &Identity, id: &str) -> Result<Message, AppError> {
    state
        .repo
        .get_message(id)
        .await?
        .filter(|m| m.student_id() == identity.subject)
        .ok_or_else(|| AppError::not_found(format!("message {id}")))
}

/// POST /api/tenant/messages: write to the hostel office.
pub async fn send(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<ToOffice>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let message = state
        .repo
        .send_message(
            &identity.subject,
            Party::Student,
            ADMIN_DESK,
            Party::Admin,
            &payload.subject,
            &payload.message,
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": message }))))
}

pub async fn inbox(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let messages = state.repo.inbox(&identity.subject, Party::Student).await?;
    let unread = messages.iter().filter(|m| !m.read).count();
    Ok(Json(json!({ "success": true, "unread": unread, "messages": messages })))
}

pub async fn sent(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let messages = state.repo.sent(&identity.subject, Party::Student).await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}

pub async fn view(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut message = own_message(&state, &identity, &id).await?;
    if message.receiver_type == Party::Student && !message.read {
        state.repo.mark_read(&id).await?;
        message.read = true;
    }
    Ok(Json(json!({ "success": true, "message": message })))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    own_message(&state, &identity, &id).await?;
    state.repo.delete_message(&id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn conversation(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let messages = state.repo.conversation(&identity.subject).await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}

/// POST /api/tenant/messages/:id/reply: answer a message on the tenant's
/// own thread. The reply always goes to the office.
pub async fn reply(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(payload): Json<Reply>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let original = own_message(&state, &identity, &id).await?;
    let subject = if original.subject.starts_with("Re: ") {
        original.subject
    } else {
        format!("Re: {}", original.subject)
    };
    let message = state
        .repo
        .send_message(
            &identity.subject,
            Party::Student,
            ADMIN_DESK,
            Party::Admin,
            &subject,
            &payload.message,
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": message }))))
}

/// DELETE /api/tenant/messages/conversation: clear the tenant's whole thread.
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.repo.delete_conversation(&identity.subject).await?;
    tracing::info!(student_id = %identity.subject, deleted, "conversation cleared");
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
