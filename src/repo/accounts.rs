use chrono::{DateTime, Utc};

use crate::auth::password::{hash_password, verify_password};
use crate::errors::AppError;
use crate::models::account::{AdminAccount, TenantLogin};
use crate::store::{to_document, Document, Query};

use super::{require, Repository, ADMINS, TENANT_AUTH};

const MIN_PASSWORD_LEN: usize = 8;

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

impl Repository {
    // ── Admin accounts ───────────────────────────────────────────

    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminAccount, AppError> {
        require("username", username)?;
        require("email", email)?;
        if !email.contains('@') {
            return Err(AppError::validation("email is not valid"));
        }
        check_password(password)?;

        let username = username.trim();
        let email = email.trim().to_lowercase();
        if self.store.get(ADMINS, username).await?.is_some() {
            return Err(AppError::validation(format!("username {username} is taken")));
        }
        if self
            .store
            .count(ADMINS, &Query::new().eq("email", email.as_str()))
            .await?
            > 0
        {
            return Err(AppError::validation("email is already registered"));
        }

        let account = AdminAccount {
            username: username.to_string(),
            email,
            password_hash: hash_password(password)?,
            created_at: now,
        };
        self.store
            .set(ADMINS, username, to_document(&account)?)
            .await?;
        tracing::info!(username = %username, "admin account created");
        Ok(account)
    }

    /// Look an admin up by username or email and check the password.
    pub async fn verify_admin(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<AdminAccount>, AppError> {
        let login = login.trim();
        let account = match self.fetch::<AdminAccount>(ADMINS, login).await? {
            Some(account) => Some(account),
            None => self
                .fetch_all::<AdminAccount>(
                    ADMINS,
                    &Query::new().eq("email", login.to_lowercase()),
                )
                .await?
                .into_iter()
                .next(),
        };

        match account {
            Some(account) if verify_password(password, &account.password_hash)? => Ok(Some(account)),
            _ => Ok(None),
        }
    }

    // ── Tenant portal logins ─────────────────────────────────────

    pub async fn register_tenant_login(
        &self,
        tenant_id: i64,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        check_password(password)?;
        self.tenant(tenant_id).await?;

        let key = TenantLogin::doc_id(tenant_id);
        if self.store.get(TENANT_AUTH, &key).await?.is_some() {
            return Err(AppError::validation(format!(
                "tenant {tenant_id} already has a login"
            )));
        }

        let login = TenantLogin {
            tenant_id,
            password_hash: hash_password(password)?,
            created_at: now,
        };
        self.store
            .set(TENANT_AUTH, &key, to_document(&login)?)
            .await?;
        tracing::info!(tenant_id, "tenant login registered");
        Ok(())
    }

    pub async fn verify_tenant_login(&self, tenant_id: i64, password: &str) -> Result<bool, AppError> {
        match self
            .fetch::<TenantLogin>(TENANT_AUTH, &TenantLogin::doc_id(tenant_id))
            .await?
        {
            Some(login) => Ok(verify_password(password, &login.password_hash)?),
            None => Ok(false),
        }
    }

    pub async fn change_tenant_password(&self, tenant_id: i64, new_password: &str) -> Result<(), AppError> {
        check_password(new_password)?;
        let mut patch = Document::new();
        patch.insert("password_hash".into(), hash_password(new_password)?.into());
        if !self
            .store
            .merge(TENANT_AUTH, &TenantLogin::doc_id(tenant_id), patch)
            .await?
        {
            return Err(AppError::not_found(format!("login for tenant {tenant_id}")));
        }
        Ok(())
    }
}
