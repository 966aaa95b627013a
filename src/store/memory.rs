//! In-memory document store.
//!
//! Reference implementation of the [`DocumentStore`] seam. Integration
//! tests seed it with vhost documents; it also pins down the ordering
//! contract (ids come back sorted) the loader relies on.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::types::{Document, DocumentStore, KeyRange, StoreError};

#[derive(Debug, Default)]
struct StoredDatabase {
    // BTreeMap keeps range reads ordered by id.
    documents: BTreeMap<String, serde_json::Value>,
    attachments: HashMap<(String, String), Bytes>,
}

/// Shared, mutable in-memory store. Cloning shares the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    databases: Arc<Mutex<HashMap<String, StoredDatabase>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `database` if absent.
    pub fn create_database(&self, database: &str) {
        let mut dbs = self.databases.lock().expect("store lock poisoned");
        dbs.entry(database.to_string()).or_default();
    }

    /// Insert or replace a document, creating the database if needed.
    pub fn put_document(&self, database: &str, id: &str, body: serde_json::Value) {
        let mut dbs = self.databases.lock().expect("store lock poisoned");
        dbs.entry(database.to_string())
            .or_default()
            .documents
            .insert(id.to_string(), body);
    }

    /// Attach raw bytes to a document.
    pub fn put_attachment(&self, database: &str, doc_id: &str, name: &str, body: impl Into<Bytes>) {
        let mut dbs = self.databases.lock().expect("store lock poisoned");
        dbs.entry(database.to_string())
            .or_default()
            .attachments
            .insert((doc_id.to_string(), name.to_string()), body.into());
    }

    /// Remove a document and its attachments.
    pub fn delete_document(&self, database: &str, doc_id: &str) {
        let mut dbs = self.databases.lock().expect("store lock poisoned");
        if let Some(db) = dbs.get_mut(database) {
            db.documents.remove(doc_id);
            db.attachments.retain(|(id, _), _| id.as_str() != doc_id);
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn all_docs(
        &self,
        database: &str,
        range: &KeyRange,
    ) -> Result<Vec<Document>, StoreError> {
        let dbs = self.databases.lock().expect("store lock poisoned");
        let db = dbs
            .get(database)
            .ok_or_else(|| StoreError::MissingDatabase(database.to_string()))?;

        Ok(db
            .documents
            .range(range.start.clone()..range.end.clone())
            .map(|(id, body)| Document {
                id: id.clone(),
                body: body.clone(),
            })
            .collect())
    }

    async fn get_attachment(
        &self,
        database: &str,
        doc_id: &str,
        name: &str,
    ) -> Result<Bytes, StoreError> {
        let dbs = self.databases.lock().expect("store lock poisoned");
        let db = dbs
            .get(database)
            .ok_or_else(|| StoreError::MissingDatabase(database.to_string()))?;
        db.attachments
            .get(&(doc_id.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::MissingAttachment {
                doc_id: doc_id.to_string(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn range_read_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store.put_document("_admin", "goydb.vhost:b", json!({"n": 2}));
        store.put_document("_admin", "goydb.vhost:a", json!({"n": 1}));
        store.put_document("_admin", "unrelated", json!({"n": 3}));

        let docs = store
            .all_docs("_admin", &KeyRange::prefix("goydb.vhost:"))
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["goydb.vhost:a", "goydb.vhost:b"]);
    }

    #[tokio::test]
    async fn missing_database_is_distinct() {
        let store = MemoryStore::new();
        let err = store
            .all_docs("_admin", &KeyRange::prefix("goydb.vhost:"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingDatabase(_)));
    }

    #[tokio::test]
    async fn attachments_round_trip() {
        let store = MemoryStore::new();
        store.put_attachment("_admin", "goydb.vhost:a", "files.zip", &b"zipbytes"[..]);
        let bytes = store
            .get_attachment("_admin", "goydb.vhost:a", "files.zip")
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), b"zipbytes");

        let err = store
            .get_attachment("_admin", "goydb.vhost:a", "other.zip")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingAttachment { .. }));
    }
}
