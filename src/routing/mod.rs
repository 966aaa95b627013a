//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Vec<VirtualHostConfig>
//!     → compiler.rs (per-domain prefix routers, conflict resolution)
//!     → RoutingTable (immutable generation)
//!     → SharedTable (atomic publish via arc-swap)
//!
//! Incoming Request (Host header, path)
//!     → table.rs (normalize host, O(1) domain lookup)
//!     → DomainHandler (longest-prefix scan)
//!     → Return: matched route action, static fs, or fall through
//! ```
//!
//! # Design Decisions
//! - Tables are compiled off the request path and never mutated after
//!   publication; dispatch reads one lock-free snapshot per request
//! - No regex in the hot path, prefix matching only
//! - Deterministic: configs arrive sorted by document id, so the same
//!   store contents always compile to the same table

pub mod compiler;
pub mod rebuild;
pub mod table;

pub use compiler::compile;
pub use rebuild::Rebuilder;
pub use table::{normalize_host, DomainHandler, RouteAction, RoutingTable, SharedTable};
