//! Virtual filesystems for tenant static file sets.
//!
//! # Responsibilities
//! - Hold one tenant's static files as an immutable in-memory tree
//! - Resolve request paths to files (directory paths fall back to index.html,
//!   slashless directory requests are redirected by the HTTP layer)
//! - Provide content types for the HTTP layer
//!
//! # Design Decisions
//! - Built once per routing-table generation, never mutated afterwards
//! - Shared via Arc; the generation that built it owns the last reference
//! - Content type from the file extension only (no sniffing)

pub mod zip;

use std::collections::HashMap;

use bytes::Bytes;

/// Error building a virtual filesystem from an attachment.
#[derive(Debug, thiserror::Error)]
pub enum VfsError {
    #[error("archive read failed: {0}")]
    Archive(#[from] ::zip::result::ZipError),

    #[error("archive entry read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One file inside a [`StaticFs`].
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub content_type: &'static str,
    pub body: Bytes,
}

/// Immutable in-memory file tree serving one tenant's static root.
#[derive(Debug, Default)]
pub struct StaticFs {
    files: HashMap<String, FileEntry>,
}

impl StaticFs {
    /// Build a filesystem from `(path, contents)` pairs.
    ///
    /// Paths are stored without a leading slash; lookups normalize the
    /// request path the same way.
    pub fn from_entries<I, P, B>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: AsRef<str>,
        B: Into<Bytes>,
    {
        let mut files = HashMap::new();
        for (path, body) in entries {
            let path = normalize_entry_path(path.as_ref());
            if path.is_empty() {
                continue;
            }
            let content_type = content_type_for(&path);
            files.insert(
                path,
                FileEntry {
                    content_type,
                    body: body.into(),
                },
            );
        }
        Self { files }
    }

    /// Resolve a request path to a file.
    ///
    /// `/` and any path ending in `/` resolve to `index.html` inside that
    /// directory.
    pub fn get(&self, request_path: &str) -> Option<&FileEntry> {
        let mut path = request_path.trim_start_matches('/').to_string();
        if path.is_empty() || path.ends_with('/') {
            path.push_str("index.html");
        }
        self.files.get(&path)
    }

    /// True if files live underneath `request_path`, making it a
    /// directory a slashless request should be redirected into.
    pub fn is_dir(&self, request_path: &str) -> bool {
        let dir = request_path.trim_start_matches('/').trim_end_matches('/');
        if dir.is_empty() {
            return !self.files.is_empty();
        }
        let prefix = format!("{dir}/");
        self.files.keys().any(|path| path.starts_with(&prefix))
    }

    /// Number of files in the tree.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn normalize_entry_path(path: &str) -> String {
    path.trim_start_matches("./").trim_start_matches('/').to_string()
}

/// Content type by extension; unknown extensions are served as octet-stream.
fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        "xml" => "application/xml",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}
