use chrono::NaiveDate;
use serde::Serialize;

use crate::models::fee::{FeeRecord, FeeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Unknown,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub total_fees: usize,
    pub pending_fees: usize,
    pub partial_fees: usize,
    pub paid_fees: usize,
    pub overdue_fees: usize,
}

/// Score how likely a student is to fall behind on fees.
///
/// `50 * pending share + 30 * partial share + 10 per overdue fee`, where a
/// fee is overdue when it is not fully paid and its due date is before
/// `today`. Due dates that do not parse are never overdue.
pub fn payment_risk(fees: &[FeeRecord], today: NaiveDate) -> RiskReport {
    let count = |status: FeeStatus| fees.iter().filter(|f| f.status == status).count();
    let total = fees.len();
    let pending = count(FeeStatus::Pending);
    let partial = count(FeeStatus::Partial);
    let paid = count(FeeStatus::Paid);

    let overdue = fees
        .iter()
        .filter(|f| f.status != FeeStatus::Paid)
        .filter(|f| {
            NaiveDate::parse_from_str(f.due_date.trim(), "%Y-%m-%d")
                .map(|due| due < today)
                .unwrap_or(false)
        })
        .count();

    if total == 0 {
        return RiskReport {
            risk_level: RiskLevel::Unknown,
            risk_score: 0.0,
            total_fees: 0,
            pending_fees: 0,
            partial_fees: 0,
            paid_fees: 0,
            overdue_fees: 0,
        };
    }

    let score = pending as f64 / total as f64 * 50.0
        + partial as f64 / total as f64 * 30.0
        + overdue as f64 * 10.0;

    let level = if score >= 60.0 {
        RiskLevel::High
    } else if score >= 30.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskReport {
        risk_level: level,
        risk_score: (score * 100.0).round() / 100.0,
        total_fees: total,
        pending_fees: pending,
        partial_fees: partial,
        paid_fees: paid,
        overdue_fees: overdue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fee(status: FeeStatus, due: &str) -> FeeRecord {
        FeeRecord {
            id: "FEE-1".into(),
            student_id: 1,
            amount: 5000.0,
            due_date: due.into(),
            fee_type: "Rent".into(),
            status,
            paid_amount: 0.0,
            paid_date: None,
            payment_method: None,
            transaction_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_no_fees_is_unknown() {
        let report = payment_risk(&[], today());
        assert_eq!(report.risk_level, RiskLevel::Unknown);
        assert_eq!(report.total_fees, 0);
    }

    #[test]
    fn test_all_paid_is_low() {
        let fees = vec![fee(FeeStatus::Paid, "2024-01-01"), fee(FeeStatus::Paid, "2024-02-01")];
        let report = payment_risk(&fees, today());
        assert_eq!(report.risk_level, RiskLevel::Low);
        assert_eq!(report.risk_score, 0.0);
        assert_eq!(report.paid_fees, 2);
    }

    #[test]
    fn test_weights_without_overdue() {
        // 1/3 pending * 50 + 1/3 partial * 30 = 26.666..
        let fees = vec![
            fee(FeeStatus::Pending, "2024-07-01"),
            fee(FeeStatus::Partial, "2024-07-01"),
            fee(FeeStatus::Paid, "2024-05-01"),
        ];
        let report = payment_risk(&fees, today());
        assert_eq!(report.risk_score, 26.67);
        assert_eq!(report.risk_level, RiskLevel::Low);
        assert_eq!(report.overdue_fees, 0);
    }

    #[test]
    fn test_overdue_pushes_to_medium() {
        let fees = vec![
            fee(FeeStatus::Pending, "2024-06-01"),
            fee(FeeStatus::Paid, "2024-05-01"),
        ];
        // 25 + 10
        let report = payment_risk(&fees, today());
        assert_eq!(report.risk_score, 35.0);
        assert_eq!(report.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_everything_overdue_is_high() {
        let fees = vec![
            fee(FeeStatus::Pending, "2024-04-01"),
            fee(FeeStatus::Partial, "2024-05-01"),
        ];
        // 25 + 15 + 20
        let report = payment_risk(&fees, today());
        assert_eq!(report.risk_score, 60.0);
        assert_eq!(report.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_unparseable_due_date_is_not_overdue() {
        let fees = vec![fee(FeeStatus::Pending, "next month")];
        let report = payment_risk(&fees, today());
        assert_eq!(report.overdue_fees, 0);
        assert_eq!(report.risk_score, 50.0);
        assert_eq!(report.risk_level, RiskLevel::Medium);
    }
}
