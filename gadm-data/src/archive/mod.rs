//! Archive extraction capability and its ZIP implementation.

mod zip;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

pub use self::zip::ZipExtractor;

/// Errors produced while unpacking an archive.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    /// The archive file could not be opened.
    #[error("failed to open archive {path}: {source}")]
    Open {
        /// Archive location.
        path: Utf8PathBuf,
        /// I/O error reported by the filesystem.
        source: std::io::Error,
    },
    /// The archive is not a readable ZIP file, or an entry is corrupt.
    #[error("failed to read archive {path}: {source}")]
    Read {
        /// Archive location.
        path: Utf8PathBuf,
        /// Decoder error.
        source: ::zip::result::ZipError,
    },
    /// Writing an extracted entry failed.
    #[error("failed to write extracted file {path}: {source}")]
    Write {
        /// Destination of the entry.
        path: Utf8PathBuf,
        /// I/O error reported by the filesystem.
        source: std::io::Error,
    },
}

/// Unpack an archive into a directory.
pub trait ArchiveExtractor {
    /// Extract `archive` into `destination`, returning the extracted files.
    fn extract(
        &self,
        archive: &Utf8Path,
        destination: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>, ArchiveError>;
}
