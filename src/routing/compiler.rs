//! Handler compilation: virtual-host configs → routing table.

use std::sync::Arc;

use axum::http::uri::Scheme;
use url::Url;

use crate::vhost::{ProxyRule, VirtualHostConfig};

use super::table::{DomainHandler, Origin, PrefixRoute, RouteAction, RoutingTable};

/// Compile configurations into a fresh routing table.
///
/// Pure: the result references nothing still under construction and can be
/// published as-is. Rules that cannot be compiled (unparsable reverse
/// targets) are logged and dropped; a domain declared by two configurations
/// resolves to the later one in load order, logged as a conflict.
pub fn compile(configs: &[VirtualHostConfig]) -> RoutingTable {
    let mut table = RoutingTable::empty();

    for config in configs {
        let handler = Arc::new(compile_config(config));

        for domain in &config.domains {
            let domain = super::normalize_host(domain);
            if domain.is_empty() {
                tracing::warn!(doc_id = %config.doc_id, "Ignoring empty domain");
                continue;
            }
            if let Some(previous) = table.insert(domain.clone(), handler.clone()) {
                tracing::warn!(
                    domain = %domain,
                    winner = %config.doc_id,
                    loser = %previous.doc_id(),
                    "Domain declared by multiple vhost configurations, later document wins"
                );
            }
        }
    }

    table
}

fn compile_config(config: &VirtualHostConfig) -> DomainHandler {
    let mut routes = Vec::with_capacity(config.rules.len());

    for (prefix, rule) in &config.rules {
        let action = match rule {
            ProxyRule::DocumentProxy { database } => RouteAction::DocumentProxy {
                database: database.clone(),
            },
            ProxyRule::ReverseProxy {
                target,
                strip_prefix,
            } => match compile_origin(target) {
                Ok(origin) => {
                    if origin.scheme == Scheme::HTTPS {
                        tracing::warn!(
                            doc_id = %config.doc_id,
                            target = %target,
                            "Reverse proxy target uses https, forwarding client is plain HTTP"
                        );
                    }
                    RouteAction::ReverseProxy {
                        origin,
                        strip_prefix: *strip_prefix,
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        doc_id = %config.doc_id,
                        prefix = %prefix,
                        target = %target,
                        error = %err,
                        "Skipping reverse proxy rule with unusable target"
                    );
                    continue;
                }
            },
        };

        routes.push(PrefixRoute {
            prefix: prefix.clone(),
            action,
        });
    }

    DomainHandler::new(config.doc_id.clone(), routes, config.static_fs.clone())
}

fn compile_origin(target: &str) -> Result<Origin, String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    Origin::from_url(&url)
}
