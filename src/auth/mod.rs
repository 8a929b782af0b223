pub mod password;
pub mod session;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::errors::AppError;
use crate::models::account::Role;
use crate::state::AppState;

/// Authenticated caller, inserted as a request extension by the auth layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub role: Role,
    /// Admin username or tenant id.
    pub subject: String,
}

impl Identity {
    /// Tenant id as stored on tenant records.
    pub fn tenant_id(&self) -> Result<i64, AppError> {
        self.subject
            .parse()
            .map_err(|_| AppError::validation("session subject is not a tenant id"))
    }
}

/// Token from `Authorization: Bearer ...` or `x-session-token`.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .or_else(|| {
            headers
                .get("x-session-token")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .filter(|t| !t.is_empty())
}

async fn authorize(
    state: &AppState,
    mut req: Request,
    next: Next,
    role: Role,
) -> Result<Response, AppError> {
    let Some(token) = session_token(req.headers()) else {
        tracing::warn!(path = %req.uri().path(), "missing session token");
        return Err(AppError::Unauthorized);
    };

    let session = state
        .sessions
        .resolve(token, Utc::now())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if session.role != role {
        tracing::warn!(
            expected = ?role,
            actual = ?session.role,
            subject = %session.subject,
            "session role mismatch"
        );
        return Err(AppError::Unauthorized);
    }

    req.extensions_mut().insert(Identity {
        role: session.role,
        subject: session.subject,
    });
    Ok(next.run(req).await)
}

/// Layer for `/api/admin`: requires an admin session.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, req, next, Role::Admin).await
}

/// Layer for `/api/tenant`: requires a tenant session.
pub async fn require_tenant(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, req, next, Role::Tenant).await
}
