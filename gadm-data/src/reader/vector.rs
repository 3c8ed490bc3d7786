//! Reader that routes a dataset path to the GeoPackage or shapefile reader.

use camino::Utf8Path;
use gadm_core::{GeoArchiveReader, ReadError, SpatialDataset};

use super::{GeoPackageReader, ShapefileReader};

/// Chooses a format reader from the shape of the data source.
///
/// Directories are read as shapefile collections and `.gpkg` files as
/// GeoPackages; anything else is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct VectorReader {
    geopackage: GeoPackageReader,
    shapefile: ShapefileReader,
}

impl VectorReader {
    /// Create a reader covering every supported format.
    pub const fn new() -> Self {
        Self {
            geopackage: GeoPackageReader,
            shapefile: ShapefileReader,
        }
    }

    fn select(&self, path: &Utf8Path) -> Result<&dyn GeoArchiveReader, ReadError> {
        if path.is_dir() {
            return Ok(&self.shapefile);
        }
        let is_geopackage = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gpkg"));
        if is_geopackage {
            Ok(&self.geopackage)
        } else {
            Err(ReadError::UnsupportedSource {
                path: path.to_path_buf(),
            })
        }
    }
}

impl GeoArchiveReader for VectorReader {
    fn list_layers(&self, path: &Utf8Path) -> Result<Vec<String>, ReadError> {
        self.select(path)?.list_layers(path)
    }

    fn read_layer(&self, path: &Utf8Path, layer: &str) -> Result<SpatialDataset, ReadError> {
        self.select(path)?.read_layer(path, layer)
    }
}
