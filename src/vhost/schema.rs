//! Virtual-host document schema.
//!
//! Wire shape of a configuration document:
//!
//! ```json
//! {
//!   "domains": ["shop.example.com"],
//!   "proxy": {
//!     "/api/": {"type": "db", "target": "shop"},
//!     "/ext/": {"type": "reverse", "target": "http://origin", "stripPrefix": true}
//!   },
//!   "static": "files.zip"
//! }
//! ```
//!
//! `proxy` keys are path prefixes; their insertion order is the rule
//! registration order (serde_json is built with `preserve_order`).

use std::sync::Arc;

use serde::Deserialize;

use crate::store::Document;
use crate::vfs::StaticFs;

/// Database holding the gateway's configuration documents.
pub const ADMIN_DATABASE: &str = "_admin";

/// Id prefix reserved for virtual-host configuration documents.
pub const DOCUMENT_PREFIX: &str = "goydb.vhost:";

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    domains: Vec<String>,
    #[serde(default)]
    proxy: serde_json::Map<String, serde_json::Value>,
    #[serde(default, rename = "static")]
    static_attachment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawProxyKind {
    Db,
    Reverse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProxyRule {
    #[serde(rename = "type")]
    kind: RawProxyKind,
    target: String,
    #[serde(default)]
    strip_prefix: bool,
}

/// One compiled-from-wire proxy rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRule {
    /// Forward into a named database of the backing store by rewriting the
    /// request path to `/<database>/<rest>`.
    DocumentProxy { database: String },
    /// Forward to an external origin, overriding the outbound Host header.
    ReverseProxy { target: String, strip_prefix: bool },
}

/// One tenant's routing policy.
#[derive(Debug, Clone)]
pub struct VirtualHostConfig {
    pub doc_id: String,
    pub domains: Vec<String>,
    /// `(path prefix, rule)` in registration order.
    pub rules: Vec<(String, ProxyRule)>,
    pub static_attachment: Option<String>,
    /// Populated by the loader iff `static_attachment` is set.
    pub static_fs: Option<Arc<StaticFs>>,
}

impl VirtualHostConfig {
    /// Decode a raw admin-database document.
    ///
    /// Fails only if the document body itself is malformed; individual
    /// rules that do not decode are logged and dropped.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let raw: RawDocument = serde_json::from_value(doc.body.clone())?;

        let mut rules = Vec::with_capacity(raw.proxy.len());
        for (prefix, value) in raw.proxy {
            match serde_json::from_value::<RawProxyRule>(value) {
                Ok(rule) => rules.push((prefix, rule.into())),
                Err(err) => {
                    tracing::warn!(
                        doc_id = %doc.id,
                        prefix = %prefix,
                        error = %err,
                        "Skipping malformed proxy rule"
                    );
                }
            }
        }

        Ok(Self {
            doc_id: doc.id.clone(),
            domains: raw.domains,
            rules,
            static_attachment: raw.static_attachment.filter(|n| !n.is_empty()),
            static_fs: None,
        })
    }
}

impl From<RawProxyRule> for ProxyRule {
    fn from(raw: RawProxyRule) -> Self {
        match raw.kind {
            RawProxyKind::Db => ProxyRule::DocumentProxy {
                database: raw.target,
            },
            RawProxyKind::Reverse => ProxyRule::ReverseProxy {
                target: raw.target,
                strip_prefix: raw.strip_prefix,
            },
        }
    }
}
