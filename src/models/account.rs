use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Portal credentials for a tenant, stored under `auth_{tenant_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantLogin {
    pub tenant_id: i64,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl TenantLogin {
    pub fn doc_id(tenant_id: i64) -> String {
        format!("auth_{tenant_id}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Tenant,
}

/// Server-side session record, keyed by the SHA-256 of the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub role: Role,
    /// Admin username or tenant id.
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
