use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantKind {
    Student,
    Professional,
}

/// A hostel resident. Stored in `tenants` under the decimal string of `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TenantKind,
    pub email: String,
    pub phone: String,
    /// Room number, empty when unassigned.
    #[serde(default)]
    pub room: String,
    /// Joining date as entered.
    pub joined: String,
    pub ac: bool,
    /// Usual bedtime, hour of day 0-23.
    pub sleep_time: u8,
    pub smoking: bool,
    pub status: String,
}

impl Tenant {
    pub fn doc_id(&self) -> String {
        self.id.to_string()
    }
}
