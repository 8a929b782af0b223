use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::fee::{FeeRecord, FeeStatus, FeeView, Payment};
use crate::store::{to_document, Query};

use super::attendance::parse_date;
use super::{require, Repository, FEES};

impl Repository {
    pub async fn add_fee(
        &self,
        student_id: i64,
        amount: f64,
        due_date: &str,
        fee_type: &str,
        now: DateTime<Utc>,
    ) -> Result<FeeRecord, AppError> {
        if !(amount > 0.0) {
            return Err(AppError::validation("amount must be positive"));
        }
        require("fee_type", fee_type)?;
        let due = parse_date(due_date)?;
        self.tenant(student_id).await?;

        let fee = FeeRecord {
            id: format!("FEE-{}", uuid::Uuid::new_v4().simple()),
            student_id,
            amount,
            due_date: due.to_string(),
            fee_type: fee_type.trim().to_string(),
            status: FeeStatus::Pending,
            paid_amount: 0.0,
            paid_date: None,
            payment_method: None,
            transaction_id: None,
            notes: None,
            created_at: now,
            updated_at: None,
        };
        self.store.set(FEES, &fee.id, to_document(&fee)?).await?;
        tracing::info!(fee_id = %fee.id, student_id, amount, "fee added");
        Ok(fee)
    }

    /// Record a payment. Status follows the paid total: Paid at or above the
    /// fee amount, Partial below it.
    pub async fn record_payment(
        &self,
        fee_id: &str,
        payment: Payment,
        now: DateTime<Utc>,
    ) -> Result<FeeRecord, AppError> {
        if payment.paid_amount < 0.0 {
            return Err(AppError::validation("paid_amount cannot be negative"));
        }
        require("payment_method", &payment.payment_method)?;

        let mut fee: FeeRecord = self
            .fetch(FEES, fee_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("fee {fee_id}")))?;

        fee.paid_amount = payment.paid_amount;
        fee.status = FeeStatus::for_payment(fee.amount, payment.paid_amount);
        fee.paid_date = Some(payment.paid_date);
        fee.payment_method = Some(payment.payment_method);
        fee.transaction_id = payment.transaction_id.filter(|t| !t.is_empty()).or(fee.transaction_id);
        fee.notes = payment.notes.filter(|n| !n.is_empty()).or(fee.notes);
        fee.updated_at = Some(now);

        if !self.store.merge(FEES, fee_id, to_document(&fee)?).await? {
            return Err(AppError::not_found(format!("fee {fee_id}")));
        }
        tracing::info!(fee_id = %fee_id, status = ?fee.status, "fee payment recorded");
        Ok(fee)
    }

    pub async fn get_fee(&self, fee_id: &str) -> Result<Option<FeeView>, AppError> {
        let Some(fee) = self.fetch::<FeeRecord>(FEES, fee_id).await? else {
            return Ok(None);
        };
        let student_name = self
            .get_tenant(fee.student_id)
            .await?
            .map(|t| t.name)
            .unwrap_or_else(|| "Unknown".to_string());
        Ok(Some(FeeView { fee, student_name }))
    }

    /// Every fee with the student's name, latest due date first.
    pub async fn list_fees(&self) -> Result<Vec<FeeView>, AppError> {
        let fees: Vec<FeeRecord> = self.fetch_all(FEES, &Query::new()).await?;
        let names: HashMap<i64, String> = self
            .list_tenants()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        let mut views: Vec<FeeView> = fees
            .into_iter()
            .map(|fee| FeeView {
                student_name: names
                    .get(&fee.student_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                fee,
            })
            .collect();
        views.sort_by(|a, b| b.fee.due_date.cmp(&a.fee.due_date));
        Ok(views)
    }

    pub async fn fees_for_student(&self, student_id: i64) -> Result<Vec<FeeRecord>, AppError> {
        let mut fees: Vec<FeeRecord> = self
            .fetch_all(FEES, &Query::new().eq("student_id", student_id))
            .await?;
        fees.sort_by(|a, b| b.due_date.cmp(&a.due_date));
        Ok(fees)
    }
}
