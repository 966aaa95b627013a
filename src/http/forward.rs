//! The three forwarding behaviors plus fallback delegation.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::http::uri::{PathAndQuery, Uri};
use axum::http::{header, HeaderMap, HeaderName, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use tower::util::BoxCloneSyncService;
use tower::ServiceExt;

use crate::routing::table::Origin;
use crate::vfs::StaticFs;

/// The application's default handler, behind a boxed tower seam. The
/// boxed service must stay `Sync` so the router state can be shared
/// across worker tasks.
pub type FallbackService = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Delegate a request to the application default handler unchanged.
pub async fn fallback(service: FallbackService, request: Request<Body>) -> Response {
    match service.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// Document-proxy: rewrite `<prefix><rest>` to `/<database>/<rest>` and
/// delegate to the application default handler. Only the path changes;
/// method, headers, query and body pass through untouched.
pub async fn document_proxy(
    service: FallbackService,
    mut request: Request<Body>,
    prefix: &str,
    database: &str,
) -> Response {
    let path = request.uri().path();
    let rest = path.strip_prefix(prefix).unwrap_or(path);
    let rest = ensure_leading_slash(rest);
    let rewritten = format!("/{database}{rest}");

    match replace_path(request.uri(), &rewritten) {
        Some(uri) => *request.uri_mut() = uri,
        None => {
            tracing::warn!(database, path = %rewritten, "Document proxy rewrite produced an invalid path");
            return (StatusCode::BAD_GATEWAY, "invalid rewritten path").into_response();
        }
    }

    fallback(service, request).await
}

/// Reverse-proxy: forward to the origin's scheme and authority with the
/// outbound Host header overridden, optionally stripping the matched
/// prefix from the path.
pub async fn reverse_proxy(
    client: &Client<HttpConnector, Body>,
    mut request: Request<Body>,
    prefix: &str,
    origin: &Origin,
    strip_prefix: bool,
) -> Response {
    if strip_prefix {
        let path = request.uri().path();
        let rest = ensure_leading_slash(path.strip_prefix(prefix).unwrap_or(path));
        match replace_path(request.uri(), &rest) {
            Some(uri) => *request.uri_mut() = uri,
            None => {
                tracing::warn!(prefix, "Prefix strip produced an invalid path");
                return (StatusCode::BAD_GATEWAY, "invalid forwarded path").into_response();
            }
        }
    }

    proxy_to_origin(client, request, origin).await
}

/// Send a request to `origin`, keeping its path and query.
pub async fn proxy_to_origin(
    client: &Client<HttpConnector, Body>,
    mut request: Request<Body>,
    origin: &Origin,
) -> Response {
    let mut parts = request.uri().clone().into_parts();
    parts.scheme = Some(origin.scheme.clone());
    parts.authority = Some(origin.authority.clone());
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }

    let uri = match Uri::from_parts(parts) {
        Ok(uri) => uri,
        Err(err) => {
            tracing::warn!(error = %err, "Could not build upstream URI");
            return (StatusCode::BAD_GATEWAY, "invalid upstream URI").into_response();
        }
    };

    *request.uri_mut() = uri;
    strip_hop_by_hop(request.headers_mut());
    request
        .headers_mut()
        .insert(header::HOST, origin.host_header.clone());

    match client.request(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(err) => {
            tracing::error!(
                origin = %origin.authority,
                error = %err,
                "Upstream request failed"
            );
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

/// Serve a request from the domain's static file set. Without a file set
/// the catch-all yields 404 for everything.
pub fn serve_static(fs: Option<&Arc<StaticFs>>, request: &Request<Body>) -> Response {
    let Some(fs) = fs else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };

    if request.method() != Method::GET && request.method() != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
            "method not allowed",
        )
            .into_response();
    }

    let path = request.uri().path();
    match fs.get(path) {
        Some(entry) => (
            [(header::CONTENT_TYPE, entry.content_type)],
            entry.body.clone(),
        )
            .into_response(),
        // Slashless directory requests redirect into the directory.
        None if !path.ends_with('/') && fs.is_dir(path) => {
            let location = match request.uri().query() {
                Some(query) => format!("{path}/?{query}"),
                None => format!("{path}/"),
            };
            (
                StatusCode::MOVED_PERMANENTLY,
                [(header::LOCATION, location)],
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Remove connection-scoped headers before forwarding (RFC 7230 §6.1):
/// the standard hop-by-hop set plus anything named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let connection_named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| name.trim().parse::<HeaderName>().ok())
        .collect();
    for name in connection_named {
        headers.remove(name);
    }

    for name in [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ] {
        headers.remove(name);
    }
    headers.remove(HeaderName::from_static("keep-alive"));
}

/// Rebuild `uri` with `path` in place of its current path, keeping the
/// query string.
fn replace_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query.as_str()).ok()?);
    Uri::from_parts(parts).ok()
}

fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
