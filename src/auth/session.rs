use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::models::account::{Role, Session};
use crate::store::{from_document, to_document, DocumentStore, Query, StoreError};

const COLLECTION: &str = "sessions";

/// Opaque bearer sessions kept in the `sessions` collection.
///
/// The raw token is returned to the client once; only its SHA-256 is stored.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn DocumentStore>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn DocumentStore>, ttl_secs: u64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub async fn create(&self, role: Role, subject: &str) -> Result<String, StoreError> {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let now = Utc::now();
        let session = Session {
            role,
            subject: subject.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.store
            .set(COLLECTION, &hash_token(&token), to_document(&session)?)
            .await?;

        tracing::info!(role = ?role, subject = %subject, "session created");
        Ok(token)
    }

    /// Resolve a token. Expired sessions are deleted and yield `None`.
    pub async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        let key = hash_token(token);
        let Some(doc) = self.store.get(COLLECTION, &key).await? else {
            return Ok(None);
        };
        let session: Session = from_document(doc)?;
        if session.expires_at <= now {
            self.store.delete(COLLECTION, &key).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub async fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        self.store.delete(COLLECTION, &hash_token(token)).await
    }

    /// Delete every session past its expiry. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut purged = 0;
        for (id, doc) in self.store.query(COLLECTION, &Query::new()).await? {
            let expired = match from_document::<Session>(doc) {
                Ok(session) => session.expires_at <= now,
                // unreadable sessions can never authenticate
                Err(_) => true,
            };
            if expired && self.store.delete(COLLECTION, &id).await? {
                purged += 1;
            }
        }
        Ok(purged)
    }
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn sessions(ttl: u64) -> SessionStore {
        SessionStore::new(Arc::new(MemoryStore::new()), ttl)
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let store = sessions(3600);
        let token = store.create(Role::Admin, "warden").await.unwrap();
        assert_eq!(token.len(), 64);

        let session = store.resolve(&token, Utc::now()).await.unwrap().unwrap();
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.subject, "warden");

        assert!(store.resolve("not-a-token", Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_does_not_resolve() {
        let store = sessions(60);
        let token = store.create(Role::Tenant, "101").await.unwrap();
        let later = Utc::now() + Duration::seconds(120);
        assert!(store.resolve(&token, later).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_and_purge() {
        let store = sessions(60);
        let a = store.create(Role::Tenant, "1").await.unwrap();
        let _b = store.create(Role::Tenant, "2").await.unwrap();

        assert!(store.revoke(&a).await.unwrap());
        assert!(store.resolve(&a, Utc::now()).await.unwrap().is_none());

        assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 0);
        let later = Utc::now() + Duration::seconds(61);
        assert_eq!(store.purge_expired(later).await.unwrap(), 1);
    }
}
