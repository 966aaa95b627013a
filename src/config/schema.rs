//! Configuration schema definitions.
//!
//! This file only configures the gateway process itself. Which domains
//! route where is tenant configuration and lives in the admin database.

use serde::{Deserialize, Serialize};

use crate::vhost;

/// Root configuration for the virtual-host gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The document database this gateway fronts.
    pub upstream: UpstreamConfig,

    /// Routing table rebuild settings.
    pub rebuild: RebuildConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The backing document database and where its vhost documents live.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the database HTTP API.
    pub url: String,

    /// Database holding virtual-host configuration documents.
    pub admin_database: String,

    /// Id prefix reserved for virtual-host documents.
    pub document_prefix: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5984".to_string(),
            admin_database: vhost::ADMIN_DATABASE.to_string(),
            document_prefix: vhost::DOCUMENT_PREFIX.to_string(),
        }
    }
}

/// Routing table rebuild settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Seconds between periodic rebuilds. SIGHUP forces one in between.
    pub interval_secs: u64,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_database() {
        let config = GatewayConfig::default();
        assert_eq!(config.upstream.url, "http://127.0.0.1:5984");
        assert_eq!(config.upstream.admin_database, "_admin");
        assert_eq!(config.upstream.document_prefix, "goydb.vhost:");
        assert_eq!(config.rebuild.interval_secs, 60);
    }

    #[test]
    fn minimal_toml_round_trips() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9999"

            [upstream]
            url = "http://db.internal:5984"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.upstream.url, "http://db.internal:5984");
        // untouched sections keep their defaults
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
