//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM / ctrl-c → trigger graceful shutdown
//!     SIGHUP → request a routing table rebuild
//!
//! Shutdown (shutdown.rs):
//!     broadcast to the server, the rebuild loop, and the signal watcher
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task holds a receiver
//! - Rebuild-on-SIGHUP goes through the same path as the periodic rebuild

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
