use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::chatbot::{self, TenantContext};
use crate::errors::AppError;
use crate::models::complaint::ComplaintStatus;
use crate::models::fee::FeeStatus;
use crate::models::message::Party;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatMessage {
    pub message: String,
}

#[derive(Deserialize)]
pub struct QuickAction {
    pub action: String,
}

async fn load_context(state: &AppState, identity: &Identity) -> Result<TenantContext, AppError> {
    let id = identity.tenant_id()?;
    let tenant = state.repo.tenant(id).await?;
    let room = if tenant.room.is_empty() {
        None
    } else {
        state.repo.get_room(&tenant.room).await?
    };
    let unpaid: Vec<_> = state
        .repo
        .fees_for_student(id)
        .await?
        .into_iter()
        .filter(|f| f.status != FeeStatus::Paid)
        .collect();
    let pending_complaints = state
        .repo
        .complaints_for_tenant(id)
        .await?
        .iter()
        .filter(|c| c.status == ComplaintStatus::Pending)
        .count();
    let unread_messages = state
        .repo
        .count_unread(&identity.subject, Party::Student)
        .await?;

    Ok(TenantContext {
        tenant,
        room,
        pending_fees: unpaid.len(),
        pending_amount: unpaid
            .iter()
            .map(|f| (f.amount - f.paid_amount).max(0.0))
            .sum(),
        unread_messages,
        pending_complaints,
        admin_contact: state.config.admin_contact.clone(),
    })
}

/// POST /api/tenant/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<ChatMessage>,
) -> Result<Json<Value>, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::validation("message cannot be empty"));
    }
    let ctx = load_context(&state, &identity).await?;
    Ok(Json(json!({
        "success": true,
        "response": chatbot::reply(message, &ctx),
        "timestamp": Utc::now().format("%H:%M").to_string(),
    })))
}

/// POST /api/tenant/chat/quick-action
pub async fn quick_action(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<QuickAction>,
) -> Result<Json<Value>, AppError> {
    let ctx = load_context(&state, &identity).await?;
    Ok(Json(json!({
        "success": true,
        "response": chatbot::quick_action(payload.action.trim(), &ctx),
    })))
}
