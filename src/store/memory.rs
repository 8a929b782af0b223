use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{Document, DocumentStore, MergeOutcome, Query, StoreError};

/// In-process document store. Each collection is one DashMap shard entry, so
/// a conditional merge holds the collection lock for its whole check-and-write.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> Result<bool, StoreError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        match docs.get_mut(id) {
            Some(doc) => {
                doc.extend(patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn merge_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &Value,
        patch: Document,
    ) -> Result<MergeOutcome, StoreError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(MergeOutcome::Missing);
        };
        let Some(doc) = docs.get_mut(id) else {
            return Ok(MergeOutcome::Missing);
        };
        if doc.get(field) != Some(expected) {
            return Ok(MergeOutcome::Mismatch);
        }
        doc.extend(patch);
        Ok(MergeOutcome::Applied)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .collections
            .get_mut(collection)
            .map(|mut docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<_> = docs
            .iter()
            .filter(|(_, doc)| query.matches(doc))
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect();
        query.sort(&mut rows);
        Ok(rows)
    }
}
