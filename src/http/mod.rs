//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! Incoming Request
//!     → server.rs (middleware stack, dispatch handler)
//!     → routing table snapshot (host lookup, prefix match)
//!     → forward.rs (doc-proxy rewrite / reverse proxy / static / fallback)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Dispatch is purely additive: hosts without a vhost behave exactly as
//!   if this layer were absent
//! - One table snapshot per request; rebuilds never stall dispatch
//! - The application default handler is a boxed tower service so the
//!   library does not care what sits behind it

pub mod forward;
pub mod request;
pub mod server;

pub use server::{app, AppState, FallbackService, GatewayServer};
