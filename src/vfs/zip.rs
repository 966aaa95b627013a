//! Zip attachment extraction.
//!
//! Tenant static file sets arrive as a zip archive attached to the vhost
//! configuration document. The whole archive is inflated up front so request
//! serving never touches the archive again.

use std::io::{Cursor, Read};

use bytes::Bytes;
use zip::ZipArchive;

use super::{StaticFs, VfsError};

/// Inflate a zip archive into a [`StaticFs`].
///
/// Directory entries are skipped; file names keep their archive-relative
/// paths.
pub fn build_filesystem(archive: &[u8]) -> Result<StaticFs, VfsError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut entries = Vec::with_capacity(zip.len());

    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut body = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut body)?;
        entries.push((name, Bytes::from(body)));
    }

    Ok(StaticFs::from_entries(entries))
}
