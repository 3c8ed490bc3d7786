//! Errors raised by [`crate::MapFetcher`].

use std::io;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use gadm_core::{LayerOutOfRange, ReadError};
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::source::TransportError;

/// Failure of a single fetch operation.
///
/// Temporary files are released before any of these is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The per-call scratch directory or archive file could not be created.
    #[error("failed to prepare scratch space under {path}: {source}")]
    Scratch {
        /// Directory the scratch space was requested in.
        path: PathBuf,
        /// I/O error reported by the filesystem.
        source: io::Error,
    },
    /// A scratch path is not valid UTF-8.
    #[error("scratch path {path:?} is not valid UTF-8")]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },
    /// Downloading the archive failed.
    #[error("failed to download archive: {source}")]
    Download {
        /// Transport failure.
        #[from]
        source: TransportError,
    },
    /// Unpacking the archive failed.
    #[error("failed to extract archive: {source}")]
    Extract {
        /// Extraction failure.
        #[from]
        source: ArchiveError,
    },
    /// The archive did not contain the expected dataset.
    #[error("archive did not contain {path}")]
    MissingDataset {
        /// Expected dataset location inside the work directory.
        path: Utf8PathBuf,
    },
    /// Reading the extracted dataset failed.
    #[error("failed to read dataset: {source}")]
    Read {
        /// Reader failure.
        #[from]
        source: ReadError,
    },
    /// The requested layer index exceeds the dataset's layer count.
    #[error(transparent)]
    LayerOutOfRange(#[from] LayerOutOfRange),
    /// A combined fetch was asked for no formats.
    #[error("no map format requested")]
    NoFormatRequested,
}
