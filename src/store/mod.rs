//! Configuration store adapter.
//!
//! # Data Flow
//! ```text
//! DocumentStore (trait)
//!     → http.rs (CouchDB-style HTTP API adapter, production)
//!     → memory.rs (in-memory reference implementation, tests)
//!
//! Consumers:
//!     vhost::loader reads the admin database through the trait,
//!     never through a concrete adapter.
//! ```
//!
//! # Design Decisions
//! - The document database is an external collaborator; this crate only
//!   specifies the range-read + attachment-fetch seam it needs
//! - A missing database is a distinct error variant, not a failure:
//!   absence of configuration is a normal state
//! - Adapters never interpret document bodies; decoding lives in `vhost`

pub mod http;
pub mod memory;
pub mod types;

pub use http::HttpDocumentStore;
pub use memory::MemoryStore;
pub use types::{Document, DocumentStore, KeyRange, StoreError};
