//! Login, signup and logout for both portals.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::session_token;
use crate::errors::AppError;
use crate::models::account::Role;
use crate::repo::ADMINS;
use crate::state::AppState;
use crate::store::Query;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/signup", post(admin_signup))
        .route("/admin/login", post(admin_login))
        .route("/tenant/signup", post(tenant_signup))
        .route("/tenant/login", post(tenant_login))
        .route("/logout", post(logout))
}

// ── DTOs ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AdminSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct AdminLogin {
    /// Username or email.
    pub login: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct TenantCredentials {
    pub tenant_id: i64,
    pub password: String,
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /api/auth/admin/signup
///
/// Open only while no admin exists. Later admins are added with an admin
/// session or from the CLI.
pub async fn admin_signup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AdminSignup>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let existing = state.repo.store().count(ADMINS, &Query::new()).await?;
    if existing > 0 {
        let token = session_token(&headers).ok_or(AppError::Unauthorized)?;
        let session = state
            .sessions
            .resolve(token, Utc::now())
            .await?
            .ok_or(AppError::Unauthorized)?;
        if session.role != Role::Admin {
            return Err(AppError::Unauthorized);
        }
    }

    let admin = state
        .repo
        .create_admin(&payload.username, &payload.email, &payload.password, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "username": admin.username,
            "email": admin.email,
        })),
    ))
}

/// POST /api/auth/admin/login
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdminLogin>,
) -> Result<Json<Value>, AppError> {
    let Some(admin) = state
        .repo
        .verify_admin(&payload.login, &payload.password)
        .await?
    else {
        tracing::warn!(login = %payload.login, "admin login failed");
        return Err(AppError::Unauthorized);
    };

    let token = state.sessions.create(Role::Admin, &admin.username).await?;
    Ok(Json(json!({
        "success": true,
        "token": token,
        "username": admin.username,
        "expires_in": state.config.session_ttl_secs,
    })))
}

/// POST /api/auth/tenant/signup
pub async fn tenant_signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TenantCredentials>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state
        .repo
        .register_tenant_login(payload.tenant_id, &payload.password, Utc::now())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "tenant_id": payload.tenant_id })),
    ))
}

/// POST /api/auth/tenant/login
pub async fn tenant_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TenantCredentials>,
) -> Result<Json<Value>, AppError> {
    if !state
        .repo
        .verify_tenant_login(payload.tenant_id, &payload.password)
        .await?
    {
        tracing::warn!(tenant_id = payload.tenant_id, "tenant login failed");
        return Err(AppError::Unauthorized);
    }

    let tenant = state.repo.tenant(payload.tenant_id).await?;
    let token = state
        .sessions
        .create(Role::Tenant, &tenant.id.to_string())
        .await?;
    Ok(Json(json!({
        "success": true,
        "token": token,
        "tenant_id": tenant.id,
        "name": tenant.name,
        "expires_in": state.config.session_ttl_secs,
    })))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&headers).ok_or(AppError::Unauthorized)?;
    let revoked = state.sessions.revoke(token).await?;
    Ok(Json(json!({ "success": true, "revoked": revoked })))
}
