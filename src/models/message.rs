use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the hostel a message participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Admin,
    Student,
}

impl Party {
    pub fn as_str(self) -> &'static str {
        match self {
            Party::Admin => "admin",
            Party::Student => "student",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    pub sender_id: String,
    pub sender_type: Party,
    pub receiver_id: String,
    pub receiver_type: Party,
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Message {
    /// The student on either end of the message.
    pub fn student_id(&self) -> &str {
        if self.sender_type == Party::Student {
            &self.sender_id
        } else {
            &self.receiver_id
        }
    }
}

/// Per-student thread summary for the admin inbox.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub student_id: String,
    pub last_message: Message,
    pub unread_count: u64,
}
