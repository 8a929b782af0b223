use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::room::Room;
use crate::models::tenant::Tenant;
use crate::state::AppState;

/// GET /api/admin/dashboard
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let counts = state.repo.dashboard(Utc::now().date_naive()).await?;
    Ok(Json(json!({ "success": true, "dashboard": counts })))
}

// ── Tenants ──────────────────────────────────────────────────

pub async fn list_tenants(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let tenants = state.repo.list_tenants().await?;
    Ok(Json(json!({ "success": true, "count": tenants.len(), "tenants": tenants })))
}

pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Json(tenant): Json<Tenant>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.repo.add_tenant(&tenant).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "tenant": tenant })),
    ))
}

pub async fn get_tenant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let tenant = state.repo.tenant(id).await?;
    Ok(Json(json!({ "success": true, "tenant": tenant })))
}

/// PUT /api/admin/tenants/:id. The path id wins over any id in the body.
pub async fn update_tenant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(mut tenant): Json<Tenant>,
) -> Result<Json<Value>, AppError> {
    tenant.id = id;
    state.repo.update_tenant(&tenant).await?;
    Ok(Json(json!({ "success": true, "tenant": tenant })))
}

pub async fn delete_tenant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.repo.delete_tenant(id).await?;
    Ok(Json(json!({ "success": true })))
}

// ── Rooms ────────────────────────────────────────────────────

pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let rooms = state.repo.list_rooms().await?;
    Ok(Json(json!({ "success": true, "count": rooms.len(), "rooms": rooms })))
}

pub async fn available_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let rooms = state.repo.available_rooms().await?;
    Ok(Json(json!({ "success": true, "count": rooms.len(), "rooms": rooms })))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(room): Json<Room>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.repo.add_room(&room).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "room": room }))))
}

/// GET /api/admin/rooms/:room_no, with the tenants living there.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_no): Path<String>,
) -> Result<Json<Value>, AppError> {
    let room = state
        .repo
        .get_room(&room_no)
        .await?
        .ok_or_else(|| AppError::not_found(format!("room {room_no}")))?;
    let occupants = state.repo.tenants_in_room(&room_no).await?;
    Ok(Json(json!({ "success": true, "room": room, "occupants": occupants })))
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(room_no): Path<String>,
    Json(mut room): Json<Room>,
) -> Result<Json<Value>, AppError> {
    room.room_no = room_no;
    state.repo.update_room(&room).await?;
    Ok(Json(json!({ "success": true, "room": room })))
}

pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_no): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.repo.delete_room(&room_no).await?;
    Ok(Json(json!({ "success": true })))
}
