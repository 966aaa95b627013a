//! HTTP adapter to a CouchDB-style document API.
//!
//! Only the two calls the gateway needs are implemented: a `_all_docs`
//! range read with bodies included, and a raw attachment fetch.

use bytes::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::types::{Document, DocumentStore, KeyRange, StoreError};

/// Document store reached over the database's own HTTP API.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    base: Url,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    #[serde(default)]
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    id: String,
    #[serde(default)]
    doc: Option<serde_json::Value>,
}

impl HttpDocumentStore {
    /// Create an adapter for the API rooted at `base`.
    pub fn new(mut base: Url, client: reqwest::Client) -> Self {
        // Url::join treats the last segment as a file unless it ends in '/'.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Self { base, client }
    }

    fn endpoint(&self, segments: &str) -> Result<Url, StoreError> {
        self.base
            .join(segments)
            .map_err(|e| StoreError::InvalidResponse(format!("bad endpoint {segments:?}: {e}")))
    }
}

impl DocumentStore for HttpDocumentStore {
    async fn all_docs(
        &self,
        database: &str,
        range: &KeyRange,
    ) -> Result<Vec<Document>, StoreError> {
        let url = self.endpoint(&format!("{database}/_all_docs"))?;
        // CouchDB range parameters are JSON-encoded.
        let start = serde_json::to_string(&range.start)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        let end = serde_json::to_string(&range.end)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .query(&[
                ("include_docs", "true"),
                ("start_key", start.as_str()),
                ("end_key", end.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::MissingDatabase(database.to_string()));
        }
        if !response.status().is_success() {
            return Err(StoreError::Request(format!(
                "_all_docs on {database:?} answered {}",
                response.status()
            )));
        }

        let body: AllDocsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(body
            .rows
            .into_iter()
            .filter_map(|row| {
                row.doc.map(|doc| Document {
                    id: row.id,
                    body: doc,
                })
            })
            .collect())
    }

    async fn get_attachment(
        &self,
        database: &str,
        doc_id: &str,
        name: &str,
    ) -> Result<Bytes, StoreError> {
        let url = self.endpoint(&format!("{database}/{doc_id}/{name}"))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::MissingAttachment {
                doc_id: doc_id.to_string(),
                name: name.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(StoreError::Request(format!(
                "attachment {name:?} on {doc_id:?} answered {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let store = HttpDocumentStore::new(
            Url::parse("http://127.0.0.1:5984/prefix").unwrap(),
            reqwest::Client::new(),
        );
        let url = store.endpoint("_admin/_all_docs").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5984/prefix/_admin/_all_docs");
    }
}
