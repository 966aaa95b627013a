//! Virtual-host configuration loading.

use std::sync::Arc;

use crate::store::{DocumentStore, KeyRange, StoreError};
use crate::vfs;

use super::schema::VirtualHostConfig;

/// Load every virtual-host configuration from the admin database.
///
/// Partial-success semantics: a document that fails to decode, or whose
/// static attachment cannot be fetched or inflated, is logged and skipped.
/// Only a failure of the range read itself is an error; a missing admin
/// database is a normal empty result.
///
/// The result is sorted by document id so duplicate-domain resolution is
/// deterministic regardless of store iteration order.
pub async fn load_all<S: DocumentStore>(
    store: &S,
    admin_database: &str,
    prefix: &str,
) -> Result<Vec<VirtualHostConfig>, StoreError> {
    let docs = match store.all_docs(admin_database, &KeyRange::prefix(prefix)).await {
        Ok(docs) => docs,
        Err(StoreError::MissingDatabase(_)) => {
            tracing::debug!(
                database = admin_database,
                "Admin database absent, no virtual hosts configured"
            );
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let mut configs = Vec::with_capacity(docs.len());
    for doc in docs {
        let mut config = match VirtualHostConfig::from_document(&doc) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(doc_id = %doc.id, error = %err, "Skipping malformed vhost document");
                continue;
            }
        };

        if let Some(name) = config.static_attachment.clone() {
            let archive = match store.get_attachment(admin_database, &doc.id, &name).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(
                        doc_id = %doc.id,
                        attachment = %name,
                        error = %err,
                        "Skipping vhost, static attachment unavailable"
                    );
                    continue;
                }
            };

            match vfs::zip::build_filesystem(&archive) {
                Ok(fs) => {
                    tracing::debug!(doc_id = %doc.id, files = fs.len(), "Static file set loaded");
                    config.static_fs = Some(Arc::new(fs));
                }
                Err(err) => {
                    tracing::warn!(
                        doc_id = %doc.id,
                        attachment = %name,
                        error = %err,
                        "Skipping vhost, static file set unusable"
                    );
                    continue;
                }
            }
        }

        configs.push(config);
    }

    configs.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
    Ok(configs)
}
