//! Gateway process configuration.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; tenant routing changes flow through
//!   the admin database, not this file
//! - All fields have defaults so the gateway runs with no config at all
//! - Validation collects every error, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    GatewayConfig, ListenerConfig, ObservabilityConfig, RebuildConfig, TimeoutConfig,
    UpstreamConfig,
};
