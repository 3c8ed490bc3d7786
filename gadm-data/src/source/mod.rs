//! Download capability for map archives.
//!
//! [`ArchiveSource`] is synchronous so the fetcher stays a plain blocking
//! pipeline. [`HttpArchiveSource`] bridges to async `reqwest` by blocking on
//! a Tokio runtime it owns.

mod error;
mod http;

use std::io::Write;

use gadm_core::ArchiveUrl;

pub use error::{SourceBuildError, TransportError};
pub use http::{DEFAULT_USER_AGENT, HttpArchiveSource, HttpArchiveSourceConfig};

/// Retrieve archive bytes for a URL.
pub trait ArchiveSource {
    /// Stream the archive at `url` into `sink`, returning the byte count.
    fn download_archive(
        &self,
        url: &ArchiveUrl,
        sink: &mut dyn Write,
    ) -> Result<u64, TransportError>;
}
