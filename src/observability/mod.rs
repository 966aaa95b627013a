//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch + rebuild produce:
//!     → tracing events (structured, request-id correlated)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → log output (stdout, env-filter controlled)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap atomic operations, safe in the hot path
//! - Labels limited to outcome and status code to bound cardinality
//! - Tracing subscriber is initialized by the binary, not the library

pub mod metrics;
