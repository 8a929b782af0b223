use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Pending,
    Partial,
    Paid,
}

impl FeeStatus {
    /// Status implied by how much of `amount` has been paid.
    pub fn for_payment(amount: f64, paid: f64) -> Self {
        if paid >= amount {
            FeeStatus::Paid
        } else if paid > 0.0 {
            FeeStatus::Partial
        } else {
            FeeStatus::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRecord {
    pub id: String,
    pub student_id: i64,
    pub amount: f64,
    /// `YYYY-MM-DD`
    pub due_date: String,
    pub fee_type: String,
    pub status: FeeStatus,
    pub paid_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub paid_amount: f64,
    pub paid_date: String,
    pub payment_method: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeeView {
    #[serde(flatten)]
    pub fee: FeeRecord,
    pub student_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_payment() {
        assert_eq!(FeeStatus::for_payment(5000.0, 5000.0), FeeStatus::Paid);
        assert_eq!(FeeStatus::for_payment(5000.0, 6000.0), FeeStatus::Paid);
        assert_eq!(FeeStatus::for_payment(5000.0, 1200.0), FeeStatus::Partial);
        assert_eq!(FeeStatus::for_payment(5000.0, 0.0), FeeStatus::Pending);
    }
}
