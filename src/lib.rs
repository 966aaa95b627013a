//! Virtual-host gateway for a document database HTTP API.
//!
//! Tenants store routing policy as `goydb.vhost:*` documents in the
//! `_admin` database. The gateway compiles those documents into an
//! immutable routing table and dispatches each request by its Host
//! header: document-proxy rules rewrite the path into a backing database,
//! reverse-proxy rules forward to external origins, and a zip attachment
//! becomes a static file set serving everything else. Hosts without a
//! configuration fall through to the database API untouched.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod store;
pub mod vfs;
pub mod vhost;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::{app, AppState, FallbackService, GatewayServer};
pub use lifecycle::Shutdown;
pub use routing::{Rebuilder, SharedTable};
pub use store::{DocumentStore, HttpDocumentStore, MemoryStore};
pub use vhost::VirtualHostConfig;
