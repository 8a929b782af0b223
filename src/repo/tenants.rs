use crate::errors::AppError;
use crate::models::tenant::Tenant;
use crate::store::{to_document, Query};

use super::{require, Repository, ROOMS, TENANTS};

impl Repository {
    fn check_tenant(&self, tenant: &Tenant) -> Result<(), AppError> {
        require("name", &tenant.name)?;
        require("email", &tenant.email)?;
        if tenant.sleep_time > 23 {
            return Err(AppError::validation("sleep_time must be an hour between 0 and 23"));
        }
        Ok(())
    }

    async fn check_room_exists(&self, room: &str) -> Result<(), AppError> {
        if room.is_empty() || self.store.get(ROOMS, room).await?.is_some() {
            return Ok(());
        }
        Err(AppError::validation(format!("room {room} does not exist")))
    }

    pub async fn add_tenant(&self, tenant: &Tenant) -> Result<(), AppError> {
        self.check_tenant(tenant)?;
        if self.store.get(TENANTS, &tenant.doc_id()).await?.is_some() {
            return Err(AppError::validation(format!(
                "tenant {} already exists",
                tenant.id
            )));
        }
        self.check_room_exists(&tenant.room).await?;

        self.store
            .set(TENANTS, &tenant.doc_id(), to_document(tenant)?)
            .await?;
        tracing::info!(tenant_id = tenant.id, room = %tenant.room, "tenant added");
        Ok(())
    }

    pub async fn update_tenant(&self, tenant: &Tenant) -> Result<(), AppError> {
        self.check_tenant(tenant)?;
        self.check_room_exists(&tenant.room).await?;

        let updated = self
            .store
            .merge(TENANTS, &tenant.doc_id(), to_document(tenant)?)
            .await?;
        if !updated {
            return Err(AppError::not_found(format!("tenant {}", tenant.id)));
        }
        Ok(())
    }

    pub async fn get_tenant(&self, id: i64) -> Result<Option<Tenant>, AppError> {
        self.fetch(TENANTS, &id.to_string()).await
    }

    /// Like [`get_tenant`](Self::get_tenant) but a missing tenant is an error.
    pub async fn tenant(&self, id: i64) -> Result<Tenant, AppError> {
        self.get_tenant(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("tenant {id}")))
    }

    /// All tenants ordered by id.
    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, AppError> {
        let mut tenants: Vec<Tenant> = self.fetch_all(TENANTS, &Query::new()).await?;
        tenants.sort_by_key(|t| t.id);
        Ok(tenants)
    }

    pub async fn count_tenants(&self) -> Result<u64, AppError> {
        Ok(self.store.count(TENANTS, &Query::new()).await?)
    }

    pub async fn delete_tenant(&self, id: i64) -> Result<(), AppError> {
        if !self.store.delete(TENANTS, &id.to_string()).await? {
            return Err(AppError::not_found(format!("tenant {id}")));
        }
        tracing::info!(tenant_id = id, "tenant deleted");
        Ok(())
    }

    pub async fn tenants_in_room(&self, room: &str) -> Result<Vec<Tenant>, AppError> {
        let mut tenants: Vec<Tenant> = self
            .fetch_all(TENANTS, &Query::new().eq("room", room))
            .await?;
        tenants.sort_by_key(|t| t.id);
        Ok(tenants)
    }

    pub async fn tenant_by_email(&self, email: &str) -> Result<Option<Tenant>, AppError> {
        let tenants: Vec<Tenant> = self
            .fetch_all(TENANTS, &Query::new().eq("email", email))
            .await?;
        Ok(tenants.into_iter().next())
    }
}
