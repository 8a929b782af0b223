//! Per-domain accessors over the document store.
//!
//! Every method either returns data, an empty result, or a typed error.
//! Store failures are never folded into "no data".

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::errors::AppError;
use crate::store::{from_document, DocumentStore, Query};

mod accounts;
mod attendance;
mod complaints;
mod dashboard;
mod fees;
mod messages;
mod rooms;
mod tenants;

pub use attendance::parse_date;
pub use dashboard::DashboardCounts;
pub use messages::ADMIN_DESK;

pub(crate) const TENANTS: &str = "tenants";
pub(crate) const ROOMS: &str = "rooms";
pub(crate) const ATTENDANCE: &str = "attendance";
pub(crate) const MESS_ATTENDANCE: &str = "mess_attendance";
pub(crate) const MESS_MENU: &str = "mess_menu";
pub(crate) const FEES: &str = "fees";
pub(crate) const MESSAGES: &str = "messages";
pub(crate) const COMPLAINTS: &str = "complaints";
pub(crate) const ADMINS: &str = "admins";
pub(crate) const TENANT_AUTH: &str = "tenant_auth";

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        match self.store.get(collection, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<T>, AppError> {
        self.store
            .query(collection, query)
            .await?
            .into_iter()
            .map(|(_, doc)| from_document(doc).map_err(AppError::from))
            .collect()
    }
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}
