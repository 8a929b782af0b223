use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::complaint::{Complaint, ComplaintStatus, Priority};
use crate::store::{to_document, Document, Query};

use super::{require, Repository, COMPLAINTS};

impl Repository {
    pub async fn submit_complaint(
        &self,
        tenant_id: i64,
        description: &str,
        complaint_type: &str,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Complaint, AppError> {
        require("description", description)?;
        require("complaint_type", complaint_type)?;
        let tenant = self.tenant(tenant_id).await?;

        let complaint = Complaint {
            id: format!("COMP-{}", uuid::Uuid::new_v4().simple()),
            tenant_id,
            tenant_name: tenant.name,
            tenant_room: tenant.room,
            description: description.trim().to_string(),
            complaint_type: complaint_type.trim().to_string(),
            priority,
            status: ComplaintStatus::Pending,
            created_at: now,
            resolved_at: None,
        };
        self.store
            .set(COMPLAINTS, &complaint.id, to_document(&complaint)?)
            .await?;
        tracing::info!(complaint_id = %complaint.id, tenant_id, priority = ?priority, "complaint submitted");
        Ok(complaint)
    }

    /// Open complaints first, then by priority, newest first within each.
    pub async fn list_complaints(&self) -> Result<Vec<Complaint>, AppError> {
        let mut complaints: Vec<Complaint> = self.fetch_all(COMPLAINTS, &Query::new()).await?;
        complaints.sort_by(|a, b| {
            let resolved = |c: &Complaint| c.status == ComplaintStatus::Resolved;
            resolved(a)
                .cmp(&resolved(b))
                .then(a.priority.cmp(&b.priority))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(complaints)
    }

    pub async fn complaints_for_tenant(&self, tenant_id: i64) -> Result<Vec<Complaint>, AppError> {
        let mut complaints: Vec<Complaint> = self
            .fetch_all(COMPLAINTS, &Query::new().eq("tenant_id", tenant_id))
            .await?;
        complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(complaints)
    }

    pub async fn resolve_complaint(&self, id: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut patch = Document::new();
        patch.insert("status".into(), "resolved".into());
        patch.insert("resolved_at".into(), now.to_rfc3339().into());
        if !self.store.merge(COMPLAINTS, id, patch).await? {
            return Err(AppError::not_found(format!("complaint {id}")));
        }
        tracing::info!(complaint_id = %id, "complaint resolved");
        Ok(())
    }

    pub async fn count_pending_complaints(&self) -> Result<u64, AppError> {
        Ok(self
            .store
            .count(COMPLAINTS, &Query::new().eq("status", "pending"))
            .await?)
    }
}
