use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which approval queue a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Leave,
    Visitor,
}

impl RequestKind {
    pub fn collection(self) -> &'static str {
        match self {
            RequestKind::Leave => "leave_requests",
            RequestKind::Visitor => "visitor_requests",
        }
    }

    pub fn request_prefix(self) -> &'static str {
        match self {
            RequestKind::Leave => "LR",
            RequestKind::Visitor => "VR",
        }
    }

    pub fn pass_prefix(self) -> &'static str {
        match self {
            RequestKind::Leave => "L",
            RequestKind::Visitor => "V",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Leave => "leave",
            RequestKind::Visitor => "visitor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

/// Leave request fields. Dates are caller-supplied strings and are not
/// checked for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveDetails {
    pub leave_from: String,
    pub leave_to: String,
    pub purpose: String,
    pub destination: String,
    pub emergency_contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorDetails {
    pub visitor_name: String,
    pub visitor_phone: String,
    pub visit_date: String,
    pub entry_time: String,
    pub purpose: String,
    pub valid_until: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestDetails {
    Leave(LeaveDetails),
    Visitor(VisitorDetails),
}

impl RequestDetails {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestDetails::Leave(_) => RequestKind::Leave,
            RequestDetails::Visitor(_) => RequestKind::Visitor,
        }
    }

    /// Names of required fields that were left empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let fields: Vec<(&'static str, &str)> = match self {
            RequestDetails::Leave(d) => vec![
                ("leave_from", &d.leave_from),
                ("leave_to", &d.leave_to),
                ("purpose", &d.purpose),
                ("destination", &d.destination),
                ("emergency_contact", &d.emergency_contact),
            ],
            RequestDetails::Visitor(d) => vec![
                ("visitor_name", &d.visitor_name),
                ("visitor_phone", &d.visitor_phone),
                ("visit_date", &d.visit_date),
                ("entry_time", &d.entry_time),
                ("purpose", &d.purpose),
                ("valid_until", &d.valid_until),
            ],
        };
        fields
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// A leave or visitor request as stored in its collection, keyed by
/// `request_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub request_id: String,
    pub kind: RequestKind,
    pub subject_id: String,
    pub subject_name: String,
    pub room: String,
    pub details: RequestDetails,
    pub status: RequestStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub issued_pass_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_token: Option<String>,
}

impl Request {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_reports_blank_values() {
        let details = RequestDetails::Leave(LeaveDetails {
            leave_from: "2026-05-01".into(),
            leave_to: "  ".into(),
            purpose: "home".into(),
            destination: String::new(),
            emergency_contact: "555-0100".into(),
        });
        assert_eq!(details.missing_fields(), vec!["leave_to", "destination"]);
    }

    #[test]
    fn test_status_serializes_capitalized() {
        let s = serde_json::to_string(&RequestStatus::Approved).unwrap();
        assert_eq!(s, "\"Approved\"");
    }
}
