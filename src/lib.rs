//! Facade crate for fetching GADM administrative-boundary maps.
//!
//! This crate re-exports the core domain types and the production fetcher so
//! callers can depend on a single package.

#![forbid(unsafe_code)]

pub use gadm_core::{
    ArchiveUrl, CountryCode, DEFAULT_VERSION, DatasetVersion, Feature, GeoArchiveReader,
    LayerOrder, LayerOutOfRange, MapFormat, MapFormats, MapRequest, PropertyValue, ReadError,
    SpatialDataset, geopackage_url, layer_filename, shapefile_url,
};
pub use gadm_data::archive::{ArchiveError, ArchiveExtractor, ZipExtractor};
pub use gadm_data::reader::{GeoPackageReader, ShapefileReader, VectorReader};
pub use gadm_data::source::{
    ArchiveSource, HttpArchiveSource, HttpArchiveSourceConfig, SourceBuildError, TransportError,
};
pub use gadm_data::{FetchError, GEOPACKAGE_LAYER_ORDER, MapFetcher};
