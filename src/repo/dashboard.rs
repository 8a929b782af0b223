use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::request::RequestKind;
use crate::store::Query;

use super::Repository;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCounts {
    pub tenants: u64,
    pub rooms: u64,
    pub occupied_rooms: u64,
    pub pending_complaints: u64,
    pub mess_today: u64,
    pub pending_leave_requests: u64,
    pub pending_visitor_requests: u64,
}

impl Repository {
    pub async fn dashboard(&self, today: NaiveDate) -> Result<DashboardCounts, AppError> {
        let pending = Query::new().eq("status", "Pending");
        Ok(DashboardCounts {
            tenants: self.count_tenants().await?,
            rooms: self.count_rooms(false).await?,
            occupied_rooms: self.count_rooms(true).await?,
            pending_complaints: self.count_pending_complaints().await?,
            mess_today: self.mess_day(today).await?.len() as u64,
            pending_leave_requests: self
                .store
                .count(RequestKind::Leave.collection(), &pending)
                .await?,
            pending_visitor_requests: self
                .store
                .count(RequestKind::Visitor.collection(), &pending)
                .await?,
        })
    }
}
