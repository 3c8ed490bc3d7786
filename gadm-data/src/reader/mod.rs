//! Format readers implementing [`gadm_core::GeoArchiveReader`].
//!
//! [`GeoPackageReader`] reads `.gpkg` files with `rusqlite-gpkg`.
//! [`ShapefileReader`] reads a directory of `.shp`/`.dbf` pairs.
//! [`VectorReader`] picks between them by path.

mod geopackage;
mod shp;
mod vector;

pub use geopackage::GeoPackageReader;
pub use shp::ShapefileReader;
pub use vector::VectorReader;
