//! Tenant virtual-host configuration.
//!
//! # Data Flow
//! ```text
//! admin database documents (goydb.vhost:*)
//!     → schema.rs (serde decode into typed config)
//!     → loader.rs (range read + attachment → StaticFs)
//!     → Vec<VirtualHostConfig>, sorted by document id
//!     → routing::compiler
//! ```
//!
//! # Design Decisions
//! - One malformed document or rule never rejects its neighbours
//! - Proxy kinds are a closed variant set; the unknown-kind branch lives
//!   only at the decode boundary
//! - Output order is deterministic (document id) so duplicate-domain
//!   resolution does not depend on store iteration order

pub mod loader;
pub mod schema;

pub use loader::load_all;
pub use schema::{ProxyRule, VirtualHostConfig, ADMIN_DATABASE, DOCUMENT_PREFIX};
