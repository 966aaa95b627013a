//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Build the axum router and middleware stack
//! - Resolve the Host header against the routing table snapshot
//! - Hand matched requests to the compiled per-domain handler
//! - Fall through to the application default handler otherwise

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::observability::metrics;
use crate::routing::{RouteAction, SharedTable};

use super::forward;
use super::request::MakeRequestUuid;

pub use super::forward::FallbackService;

/// Shared state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    /// Currently published routing table.
    pub table: SharedTable,
    /// Outbound client shared by all reverse-proxy routes.
    pub client: Client<HttpConnector, Body>,
    /// The application's default handler.
    pub fallback: FallbackService,
}

/// Build the gateway's axum application.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let request_id = header::HeaderName::from_static("x-request-id");
    Router::new()
        .route("/{*path}", any(dispatch))
        .route("/", any(dispatch))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}

/// HTTP server for the virtual-host gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    pub fn new(config: &GatewayConfig, state: AppState) -> Self {
        let router = app(state, Duration::from_secs(config.timeouts.request_secs));
        Self { router }
    }

    /// Serve connections until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main dispatch handler: one table snapshot, one routing decision.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let host = request_host(&request);
    let path = request.uri().path().to_string();

    let snapshot = state.table.load();
    let handler = host.as_deref().and_then(|h| snapshot.lookup(h));

    let Some(handler) = handler else {
        tracing::debug!(host = host.as_deref().unwrap_or("<none>"), path = %path, "No vhost, falling through");
        let response = forward::fallback(state.fallback, request).await;
        metrics::record_dispatch("fallback", response.status().as_u16(), start);
        return response;
    };

    let (outcome, response) = match handler.route(&path) {
        Some(route) => match &route.action {
            RouteAction::DocumentProxy { database } => {
                tracing::debug!(path = %path, prefix = %route.prefix, database = %database, "Document proxy");
                (
                    "doc-proxy",
                    forward::document_proxy(state.fallback, request, &route.prefix, database).await,
                )
            }
            RouteAction::ReverseProxy {
                origin,
                strip_prefix,
            } => {
                tracing::debug!(path = %path, prefix = %route.prefix, origin = %origin.authority, "Reverse proxy");
                (
                    "reverse-proxy",
                    forward::reverse_proxy(
                        &state.client,
                        request,
                        &route.prefix,
                        origin,
                        *strip_prefix,
                    )
                    .await,
                )
            }
        },
        None => ("static", forward::serve_static(handler.static_fs(), &request)),
    };

    metrics::record_dispatch(outcome, response.status().as_u16(), start);
    response
}

/// The host a request was addressed to: the Host header, or for HTTP/2
/// the `:authority` carried in the URI.
fn request_host(request: &Request<Body>) -> Option<String> {
    if let Some(value) = request.headers().get(header::HOST) {
        return value.to_str().ok().map(str::to_string);
    }
    request
        .uri()
        .authority()
        .map(|authority| authority.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_satisfies_router_bounds() {
        fn assert_shareable<T: Clone + Send + Sync + 'static>() {}
        assert_shareable::<AppState>();
    }

    #[test]
    fn host_prefers_header() {
        let request = Request::builder()
            .uri("http://uri-host.example/x")
            .header("host", "header-host.example")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&request).as_deref(), Some("header-host.example"));
    }

    #[test]
    fn host_falls_back_to_authority() {
        let request = Request::builder()
            .uri("http://uri-host.example:8080/x")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&request).as_deref(), Some("uri-host.example:8080"));
    }

    #[test]
    fn host_absent() {
        let request = Request::builder().uri("/x").body(Body::empty()).unwrap();
        assert_eq!(request_host(&request), None);
    }
}
