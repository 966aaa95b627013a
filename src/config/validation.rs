//! Configuration validation.
//!
//! Semantic checks on an already-parsed [`GatewayConfig`]; serde handles
//! the syntactic ones. All errors are collected, not just the first.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    InvalidBindAddress(String),
    InvalidUpstreamUrl(String),
    InvalidMetricsAddress(String),
    EmptyAdminDatabase,
    EmptyDocumentPrefix,
    ZeroRebuildInterval,
    ZeroRequestTimeout,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBindAddress(addr) => write!(f, "listener.bind_address {addr:?} is not a socket address"),
            Self::InvalidUpstreamUrl(url) => write!(f, "upstream.url {url:?} is not a usable http(s) URL"),
            Self::InvalidMetricsAddress(addr) => write!(f, "observability.metrics_address {addr:?} is not a socket address"),
            Self::EmptyAdminDatabase => write!(f, "upstream.admin_database must not be empty"),
            Self::EmptyDocumentPrefix => write!(f, "upstream.document_prefix must not be empty"),
            Self::ZeroRebuildInterval => write!(f, "rebuild.interval_secs must be greater than zero"),
            Self::ZeroRequestTimeout => write!(f, "timeouts.request_secs must be greater than zero"),
        }
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(&config.upstream.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {}
        _ => errors.push(ValidationError::InvalidUpstreamUrl(
            config.upstream.url.clone(),
        )),
    }

    if config.upstream.admin_database.is_empty() {
        errors.push(ValidationError::EmptyAdminDatabase);
    }
    if config.upstream.document_prefix.is_empty() {
        errors.push(ValidationError::EmptyDocumentPrefix);
    }
    if config.rebuild.interval_secs == 0 {
        errors.push(ValidationError::ZeroRebuildInterval);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
