//! Archive retrieval and parsing for GADM country maps.
//!
//! Responsibilities:
//! - Download country archives over HTTP ([`source`]).
//! - Unpack ZIP archives into per-call scratch space ([`archive`]).
//! - Read GeoPackage and shapefile layers into [`gadm_core::SpatialDataset`]
//!   values ([`reader`]).
//! - Orchestrate the above in [`MapFetcher`].
//!
//! Boundaries:
//! - Naming conventions and layer-order policy live in `gadm-core`.
//! - No caching, retries or resumable downloads.
//!
//! Invariants:
//! - Downloaded archives never outlive the call that fetched them.
//! - No global mutable state; every call uses its own work directory.
#![forbid(unsafe_code)]

pub mod archive;
mod error;
mod fetch;
pub mod reader;
pub mod source;
pub mod test_support;

pub use error::FetchError;
pub use fetch::{GEOPACKAGE_LAYER_ORDER, MapFetcher};
