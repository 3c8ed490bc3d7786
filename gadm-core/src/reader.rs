//! Capability for turning an extracted archive into a [`SpatialDataset`].

use std::error::Error as StdError;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::SpatialDataset;

/// Boxed error raised by the underlying storage library.
pub type BoxedSource = Box<dyn StdError + Send + Sync>;

/// Errors produced while listing or reading layers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadError {
    /// The dataset could not be opened.
    #[error("failed to open dataset at {path}: {source}")]
    Open {
        /// Dataset location.
        path: Utf8PathBuf,
        /// Underlying library error.
        source: BoxedSource,
    },
    /// Enumerating the dataset's layers failed.
    #[error("failed to list layers of {path}: {source}")]
    ListLayers {
        /// Dataset location.
        path: Utf8PathBuf,
        /// Underlying library error.
        source: BoxedSource,
    },
    /// The dataset has no layer with the requested name.
    #[error("dataset {path} has no layer named '{layer}'")]
    LayerNotFound {
        /// Dataset location.
        path: Utf8PathBuf,
        /// Requested layer name.
        layer: String,
    },
    /// Reading features from a layer failed.
    #[error("failed to read features of layer '{layer}': {source}")]
    Query {
        /// Layer being read.
        layer: String,
        /// Underlying library error.
        source: BoxedSource,
    },
    /// A stored geometry could not be decoded.
    #[error("invalid geometry in layer '{layer}': {message}")]
    Geometry {
        /// Layer being read.
        layer: String,
        /// Decoder diagnostic.
        message: String,
    },
    /// No reader understands the dataset at this path.
    #[error("unsupported dataset source {path}")]
    UnsupportedSource {
        /// Dataset location.
        path: Utf8PathBuf,
    },
}

/// Read vector layers from a dataset on disk.
///
/// `path` is whatever the format treats as a data source: a GeoPackage file,
/// or a directory of shapefiles.
///
/// # Examples
///
/// ```rust
/// use camino::Utf8Path;
/// use gadm_core::{GeoArchiveReader, ReadError, SpatialDataset};
///
/// struct SingleLayer;
///
/// impl GeoArchiveReader for SingleLayer {
///     fn list_layers(&self, _path: &Utf8Path) -> Result<Vec<String>, ReadError> {
///         Ok(vec!["ADM_0".to_owned()])
///     }
///
///     fn read_layer(&self, path: &Utf8Path, layer: &str) -> Result<SpatialDataset, ReadError> {
///         if layer != "ADM_0" {
///             return Err(ReadError::LayerNotFound {
///                 path: path.to_path_buf(),
///                 layer: layer.to_owned(),
///             });
///         }
///         Ok(SpatialDataset { layer: layer.to_owned(), ..SpatialDataset::default() })
///     }
/// }
///
/// let dataset = SingleLayer.read_layer(Utf8Path::new("x.gpkg"), "ADM_0")?;
/// assert!(dataset.is_empty());
/// # Ok::<(), ReadError>(())
/// ```
pub trait GeoArchiveReader {
    /// Layer names in the library's native listing order.
    fn list_layers(&self, path: &Utf8Path) -> Result<Vec<String>, ReadError>;

    /// Parse every feature of `layer`.
    fn read_layer(&self, path: &Utf8Path, layer: &str) -> Result<SpatialDataset, ReadError>;
}
