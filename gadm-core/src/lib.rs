//! Core domain types for fetching GADM administrative-boundary maps.
//!
//! Responsibilities:
//! - Describe a map request (country, dataset version, format, layer).
//! - Encode the archive naming conventions used by the GADM distribution.
//! - Define the reader capability that turns extracted files into a
//!   [`SpatialDataset`].
//!
//! Boundaries:
//! - No network or archive I/O happens here (lives in `gadm-data`).
//! - Country codes are carried verbatim and never checked against a list.

#![forbid(unsafe_code)]

mod dataset;
mod layer;
mod naming;
mod reader;
mod request;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use dataset::{Feature, PropertyValue, SpatialDataset};
pub use layer::{LayerOrder, LayerOutOfRange};
pub use naming::{
    ARCHIVE_HOST, ArchiveUrl, geopackage_filename, geopackage_url, layer_filename, shapefile_url,
    version_without_dots,
};
pub use reader::{BoxedSource, GeoArchiveReader, ReadError};
pub use request::{
    CountryCode, DEFAULT_VERSION, DatasetVersion, MapFormat, MapFormats, MapRequest,
    ParseMapFormatError,
};
