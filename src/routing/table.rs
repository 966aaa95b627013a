//! Routing table generations and the shared publication point.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::header::HeaderValue;
use axum::http::uri::{Authority, Scheme};

use crate::vfs::StaticFs;

/// Parsed reverse-proxy target: scheme, authority and the Host header
/// value presented to the origin.
#[derive(Debug, Clone)]
pub struct Origin {
    pub scheme: Scheme,
    pub authority: Authority,
    pub host_header: HeaderValue,
}

impl Origin {
    /// Derive the forwarding target from a parsed URL. The Host header
    /// keeps an explicit port only when the URL carries one.
    pub fn from_url(url: &url::Url) -> Result<Self, String> {
        use std::str::FromStr;

        let scheme = Scheme::from_str(url.scheme()).map_err(|e| e.to_string())?;
        let host = url.host_str().ok_or("target has no host")?;
        let authority_str = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority_str).map_err(|e| e.to_string())?;
        let host_header = HeaderValue::from_str(&authority_str).map_err(|e| e.to_string())?;

        Ok(Self {
            scheme,
            authority,
            host_header,
        })
    }
}

/// What to do with a request whose path matched a prefix.
#[derive(Debug, Clone)]
pub enum RouteAction {
    /// Rewrite the path to `/<database>/<rest>` and hand the request to
    /// the application's default handler.
    DocumentProxy { database: String },
    /// Forward to an external origin.
    ReverseProxy { origin: Origin, strip_prefix: bool },
}

/// One registered prefix route.
#[derive(Debug, Clone)]
pub struct PrefixRoute {
    pub prefix: String,
    pub action: RouteAction,
}

/// Compiled handler for one domain: ordered prefix routes over an
/// optional static file set.
#[derive(Debug)]
pub struct DomainHandler {
    /// Source document, kept for conflict logs.
    doc_id: String,
    /// Sorted longest-prefix-first; stable within equal lengths.
    routes: Vec<PrefixRoute>,
    static_fs: Option<Arc<StaticFs>>,
}

impl DomainHandler {
    /// Build a handler from routes in registration order.
    ///
    /// An exact duplicate prefix overwrites the earlier registration;
    /// lookups then use longest-prefix precedence.
    pub fn new(doc_id: String, routes: Vec<PrefixRoute>, static_fs: Option<Arc<StaticFs>>) -> Self {
        let mut deduped: Vec<PrefixRoute> = Vec::with_capacity(routes.len());
        for route in routes {
            if let Some(existing) = deduped.iter_mut().find(|r| r.prefix == route.prefix) {
                *existing = route;
            } else {
                deduped.push(route);
            }
        }
        deduped.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Self {
            doc_id,
            routes: deduped,
            static_fs,
        }
    }

    /// Longest prefix route matching `path`, if any.
    pub fn route(&self, path: &str) -> Option<&PrefixRoute> {
        self.routes.iter().find(|r| path.starts_with(&r.prefix))
    }

    pub fn static_fs(&self) -> Option<&Arc<StaticFs>> {
        self.static_fs.as_ref()
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }
}

/// One immutable generation of the domain → handler mapping.
#[derive(Debug, Default)]
pub struct RoutingTable {
    by_domain: HashMap<String, Arc<DomainHandler>>,
}

impl RoutingTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register `handler` under `domain` (already normalized). Returns the
    /// previous handler on a duplicate registration.
    pub(crate) fn insert(
        &mut self,
        domain: String,
        handler: Arc<DomainHandler>,
    ) -> Option<Arc<DomainHandler>> {
        self.by_domain.insert(domain, handler)
    }

    /// Handler for a raw Host header value, if one is registered.
    pub fn lookup(&self, host: &str) -> Option<Arc<DomainHandler>> {
        self.by_domain.get(&normalize_host(host)).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.by_domain.keys().map(String::as_str)
    }
}

/// The single shared pointer between the rebuild task and all dispatch
/// tasks. Readers always observe a complete table; publication is one
/// atomic swap.
#[derive(Debug, Clone)]
pub struct SharedTable {
    current: Arc<ArcSwap<RoutingTable>>,
}

impl SharedTable {
    /// Start with an empty table (everything falls through).
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(RoutingTable::empty())),
        }
    }

    /// Snapshot the current generation. The snapshot stays valid across
    /// concurrent publishes.
    pub fn load(&self) -> Arc<RoutingTable> {
        self.current.load_full()
    }

    /// Atomically replace the current generation. The superseded table is
    /// dropped once the last in-flight snapshot goes away.
    pub fn publish(&self, table: RoutingTable) {
        self.current.store(Arc::new(table));
    }
}

impl Default for SharedTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a Host header value for table keys: strip a trailing
/// `:port` and fold to ASCII lowercase. Bracketed IPv6 literals keep
/// their brackets.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let stripped = match host.rfind(':') {
        Some(idx) if host[idx + 1..].bytes().all(|b| b.is_ascii_digit()) && !host[idx + 1..].is_empty() => {
            &host[..idx]
        }
        _ => host,
    };
    stripped.to_ascii_lowercase()
}
