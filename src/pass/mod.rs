//! Signed pass tokens.
//!
//! A pass is an HS256 JWT whose claims carry a snapshot of the approved
//! request (or tenant record, for a student ID) plus the approver and issue
//! time. Clients render the token as a QR code; the gate scans it back into
//! [`PassIssuer::verify`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::metrics;
use crate::models::request::{Request, RequestDetails, RequestKind};
use crate::models::tenant::Tenant;

const ISSUER: &str = "hostel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    LeavePass,
    VisitorPass,
    StudentId,
}

impl PassKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PassKind::LeavePass => "leave_pass",
            PassKind::VisitorPass => "visitor_pass",
            PassKind::StudentId => "student_id",
        }
    }
}

impl From<RequestKind> for PassKind {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Leave => PassKind::LeavePass,
            RequestKind::Visitor => PassKind::VisitorPass,
        }
    }
}

/// Fields embedded in a pass. Validity bounds are kept as supplied; only
/// `valid_until` is interpreted, at verification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassFields {
    pub pass_id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub room: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    pub issued_at: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl PassFields {
    /// Snapshot of an approved request.
    pub fn for_request(request: &Request, pass_id: &str, approver: &str, now: DateTime<Utc>) -> Self {
        let mut extra = BTreeMap::new();
        let (valid_from, valid_until) = match &request.details {
            RequestDetails::Leave(d) => {
                extra.insert("destination".to_string(), d.destination.clone());
                extra.insert("purpose".to_string(), d.purpose.clone());
                extra.insert("emergency_contact".to_string(), d.emergency_contact.clone());
                (d.leave_from.clone(), d.leave_to.clone())
            }
            RequestDetails::Visitor(d) => {
                extra.insert("visitor_name".to_string(), d.visitor_name.clone());
                extra.insert("visitor_phone".to_string(), d.visitor_phone.clone());
                extra.insert("purpose".to_string(), d.purpose.clone());
                (
                    join_date_time(&d.visit_date, &d.entry_time),
                    join_date_time(&d.visit_date, &d.valid_until),
                )
            }
        };

        Self {
            pass_id: pass_id.to_string(),
            subject_id: request.subject_id.clone(),
            subject_name: request.subject_name.clone(),
            room: request.room.clone(),
            request_id: Some(request.request_id.clone()),
            valid_from: Some(valid_from),
            valid_until: Some(valid_until),
            approved_by: Some(approver.to_string()),
            issued_at: now.to_rfc3339(),
            extra,
        }
    }

    /// Digital student ID. No validity window.
    pub fn student_id(tenant: &Tenant, now: DateTime<Utc>) -> Self {
        let mut extra = BTreeMap::new();
        extra.insert("email".to_string(), tenant.email.clone());
        extra.insert("phone".to_string(), tenant.phone.clone());
        Self {
            pass_id: format!("ID-{}", tenant.id),
            subject_id: tenant.id.to_string(),
            subject_name: tenant.name.clone(),
            room: tenant.room.clone(),
            request_id: None,
            valid_from: None,
            valid_until: None,
            approved_by: None,
            issued_at: now.to_rfc3339(),
            extra,
        }
    }
}

/// Visitor times are often given as `HH:MM` alone; anchor them to the visit
/// date so the bound can be checked.
fn join_date_time(date: &str, time: &str) -> String {
    let time = time.trim();
    if NaiveTime::parse_from_str(time, "%H:%M").is_ok()
        || NaiveTime::parse_from_str(time, "%H:%M:%S").is_ok()
    {
        format!("{} {time}", date.trim())
    } else {
        time.to_string()
    }
}

/// Interpret a validity bound. A bare date means the end of that day.
/// Naive timestamps are taken as UTC. Unrecognised text yields `None` and is
/// not enforced.
pub fn parse_validity_end(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    kind: PassKind,
    pass: PassFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<PassKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<PassFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PassVerification {
    fn rejected(error: &str) -> Self {
        Self {
            valid: false,
            kind: None,
            fields: None,
            error: Some(error.to_string()),
        }
    }
}

pub struct PassIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl PassIssuer {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry lives in the pass fields, checked in verify()
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.set_issuer(&[ISSUER]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign `fields` as a pass of `kind`. The token depends only on the
    /// kind, the fields and the secret.
    pub fn issue(&self, kind: PassKind, fields: &PassFields) -> Result<String, AppError> {
        let claims = Claims {
            iss: ISSUER.to_string(),
            kind,
            pass: fields.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("failed to sign pass: {e}"))?;

        metrics::record_pass_issued(kind);
        tracing::info!(pass_id = %fields.pass_id, kind = kind.as_str(), "pass issued");
        Ok(token)
    }

    /// Check signature and issuer, then the embedded validity end against
    /// `now`. An expired pass still returns its fields.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> PassVerification {
        let result = match decode::<Claims>(token.trim(), &self.decoding, &self.validation) {
            Ok(data) => {
                let claims = data.claims;
                let expired = claims
                    .pass
                    .valid_until
                    .as_deref()
                    .and_then(parse_validity_end)
                    .is_some_and(|end| end < now);
                PassVerification {
                    valid: !expired,
                    kind: Some(claims.kind),
                    fields: Some(claims.pass),
                    error: expired.then(|| "pass expired".to_string()),
                }
            }
            Err(e) => match e.kind() {
                ErrorKind::InvalidSignature => PassVerification::rejected("pass signature mismatch"),
                ErrorKind::InvalidIssuer => PassVerification::rejected("pass issuer mismatch"),
                ErrorKind::InvalidAlgorithm => PassVerification::rejected("pass algorithm not accepted"),
                _ => PassVerification::rejected("malformed pass token"),
            },
        };

        let outcome = match (result.valid, result.error.as_deref()) {
            (true, _) => "valid",
            (false, Some("pass expired")) => "expired",
            _ => "invalid",
        };
        metrics::record_pass_verified(outcome);
        if !result.valid {
            tracing::warn!(outcome, error = result.error.as_deref().unwrap_or(""), "pass rejected");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::{LeaveDetails, RequestKind, RequestStatus, VisitorDetails};
    use chrono::Duration;

    fn fields(valid_until: Option<&str>) -> PassFields {
        PassFields {
            pass_id: "L-abc".into(),
            subject_id: "S1".into(),
            subject_name: "Ravi".into(),
            room: "12".into(),
            request_id: Some("LR-abc".into()),
            valid_from: Some("2026-05-01".into()),
            valid_until: valid_until.map(str::to_string),
            approved_by: Some("warden".into()),
            issued_at: "2026-04-30T09:00:00+00:00".into(),
            extra: BTreeMap::from([("destination".to_string(), "Pune".to_string())]),
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let issuer = PassIssuer::new("test-secret");
        let f = fields(Some("2026-05-04"));
        let token = issuer.issue(PassKind::LeavePass, &f).unwrap();

        let result = issuer.verify(&token, at("2026-05-02T12:00:00Z"));
        assert!(result.valid);
        assert_eq!(result.kind, Some(PassKind::LeavePass));
        assert_eq!(result.fields, Some(f));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_forged_token_is_rejected() {
        let issuer = PassIssuer::new("test-secret");
        let forger = PassIssuer::new("guessed-secret");
        let token = forger.issue(PassKind::LeavePass, &fields(None)).unwrap();

        let result = issuer.verify(&token, Utc::now());
        assert!(!result.valid);
        assert!(result.fields.is_none());
        assert_eq!(result.error.as_deref(), Some("pass signature mismatch"));
    }

    #[test]
    fn test_edited_payload_is_rejected() {
        let issuer = PassIssuer::new("test-secret");
        let token = issuer.issue(PassKind::LeavePass, &fields(None)).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let other = issuer
            .issue(
                PassKind::LeavePass,
                &PassFields {
                    room: "99".into(),
                    ..fields(None)
                },
            )
            .unwrap();
        parts[1] = other.split('.').nth(1).unwrap().to_string();
        let spliced = parts.join(".");

        let result = issuer.verify(&spliced, Utc::now());
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("pass signature mismatch"));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let issuer = PassIssuer::new("test-secret");
        let result = issuer.verify("not a token", Utc::now());
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("malformed pass token"));
    }

    #[test]
    fn test_expired_pass_keeps_fields() {
        let issuer = PassIssuer::new("test-secret");
        let token = issuer
            .issue(PassKind::LeavePass, &fields(Some("2026-05-04")))
            .unwrap();

        let still_valid = issuer.verify(&token, at("2026-05-04T23:00:00Z"));
        assert!(still_valid.valid);

        let result = issuer.verify(&token, at("2026-05-05T00:00:01Z"));
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("pass expired"));
        assert!(result.fields.is_some());
    }

    #[test]
    fn test_unparseable_validity_is_not_enforced() {
        let issuer = PassIssuer::new("test-secret");
        let token = issuer
            .issue(PassKind::LeavePass, &fields(Some("after the exams")))
            .unwrap();
        assert!(issuer.verify(&token, Utc::now()).valid);
    }

    #[test]
    fn test_parse_validity_end_formats() {
        assert_eq!(
            parse_validity_end("2026-05-04T18:30:00+05:30"),
            Some(at("2026-05-04T13:00:00Z"))
        );
        assert_eq!(parse_validity_end("2026-05-04 18:00"), Some(at("2026-05-04T18:00:00Z")));
        assert_eq!(parse_validity_end("2026-05-04"), Some(at("2026-05-04T23:59:59Z")));
        assert_eq!(parse_validity_end("tomorrow"), None);
    }

    #[test]
    fn test_visitor_times_are_anchored_to_visit_date() {
        let request = Request {
            request_id: "VR-1".into(),
            kind: RequestKind::Visitor,
            subject_id: "7".into(),
            subject_name: "Meera".into(),
            room: "4".into(),
            details: RequestDetails::Visitor(VisitorDetails {
                visitor_name: "Asha".into(),
                visitor_phone: "98".into(),
                visit_date: "2026-05-02".into(),
                entry_time: "10:00".into(),
                purpose: "Visit".into(),
                valid_until: "18:00".into(),
            }),
            status: RequestStatus::Approved,
            submitted_at: Utc::now(),
            decided_at: None,
            decided_by: None,
            rejection_reason: None,
            issued_pass_id: Some("V-1".into()),
            pass_token: None,
        };

        let f = PassFields::for_request(&request, "V-1", "warden", Utc::now());
        assert_eq!(f.valid_from.as_deref(), Some("2026-05-02 10:00"));
        assert_eq!(f.valid_until.as_deref(), Some("2026-05-02 18:00"));
        assert_eq!(f.extra.get("visitor_name").map(String::as_str), Some("Asha"));
    }

    #[test]
    fn test_leave_pass_carries_destination() {
        let request = Request {
            request_id: "LR-1".into(),
            kind: RequestKind::Leave,
            subject_id: "S1".into(),
            subject_name: "Ravi".into(),
            room: "12".into(),
            details: RequestDetails::Leave(LeaveDetails {
                leave_from: "2026-05-01".into(),
                leave_to: "2026-05-04".into(),
                purpose: "home".into(),
                destination: "Pune".into(),
                emergency_contact: "98".into(),
            }),
            status: RequestStatus::Approved,
            submitted_at: Utc::now(),
            decided_at: None,
            decided_by: None,
            rejection_reason: None,
            issued_pass_id: Some("L-1".into()),
            pass_token: None,
        };
        let now = Utc::now() - Duration::days(1);
        let f = PassFields::for_request(&request, "L-1", "warden", now);
        assert_eq!(f.valid_until.as_deref(), Some("2026-05-04"));
        assert_eq!(f.extra["destination"], "Pune");
        assert_eq!(f.issued_at, now.to_rfc3339());
    }

    #[test]
    fn test_issue_is_deterministic() {
        let issuer = PassIssuer::new("test-secret");
        let f = fields(Some("2026-05-04"));
        let a = issuer.issue(PassKind::LeavePass, &f).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let b = issuer.issue(PassKind::LeavePass, &f).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_trip_for_every_pass_kind() {
        let now = at("2026-05-01T08:00:00Z");
        let visitor_request = Request {
            request_id: "VR-9".into(),
            kind: RequestKind::Visitor,
            subject_id: "7".into(),
            subject_name: "Meera".into(),
            room: "4".into(),
            details: RequestDetails::Visitor(VisitorDetails {
                visitor_name: "Asha".into(),
                visitor_phone: "98".into(),
                visit_date: "2026-05-02".into(),
                entry_time: "10:00".into(),
                purpose: "Visit".into(),
                valid_until: "18:00".into(),
            }),
            status: RequestStatus::Approved,
            submitted_at: now,
            decided_at: Some(now),
            decided_by: Some("warden".into()),
            rejection_reason: None,
            issued_pass_id: Some("V-9".into()),
            pass_token: None,
        };
        let tenant = Tenant {
            id: 7,
            name: "Meera".into(),
            kind: crate::models::tenant::TenantKind::Professional,
            email: "meera@hostel.test".into(),
            phone: "98".into(),
            room: "4".into(),
            joined: "2026-01-01".into(),
            ac: false,
            sleep_time: 23,
            smoking: false,
            status: "Active".into(),
        };
        let bare = PassFields {
            request_id: None,
            valid_from: None,
            valid_until: None,
            approved_by: None,
            extra: BTreeMap::new(),
            ..fields(None)
        };

        let cases = [
            (PassKind::LeavePass, fields(Some("2026-05-04"))),
            (PassKind::LeavePass, bare),
            (
                PassKind::VisitorPass,
                PassFields::for_request(&visitor_request, "V-9", "warden", now),
            ),
            (PassKind::StudentId, PassFields::student_id(&tenant, now)),
        ];

        let issuer = PassIssuer::new("test-secret");
        for (kind, f) in cases {
            let token = issuer.issue(kind, &f).unwrap();
            let result = issuer.verify(&token, now);
            assert!(result.valid, "{kind:?} {f:?}: {:?}", result.error);
            assert_eq!(result.kind, Some(kind));
            assert_eq!(result.fields, Some(f));
        }
    }
}
