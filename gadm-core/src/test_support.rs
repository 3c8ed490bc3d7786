//! Test-only, in-memory `GeoArchiveReader` used by unit and behaviour tests.

use std::cell::RefCell;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{GeoArchiveReader, ReadError, SpatialDataset};

/// Reader serving a fixed, ordered list of layers regardless of path.
///
/// Every call is recorded so tests can assert which layer was selected.
#[derive(Debug, Default)]
pub struct MemoryReader {
    layers: Vec<SpatialDataset>,
    reads: RefCell<Vec<(Utf8PathBuf, String)>>,
}

impl MemoryReader {
    /// Reader whose native listing is `names`, each layer empty.
    pub fn with_layer_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_layers(names.into_iter().map(|name| SpatialDataset {
            layer: name.into(),
            ..SpatialDataset::default()
        }))
    }

    /// Reader serving the supplied datasets, listed in iteration order.
    pub fn with_layers(layers: impl IntoIterator<Item = SpatialDataset>) -> Self {
        Self {
            layers: layers.into_iter().collect(),
            reads: RefCell::new(Vec::new()),
        }
    }

    /// `(path, layer)` pairs passed to [`GeoArchiveReader::read_layer`].
    pub fn reads(&self) -> Vec<(Utf8PathBuf, String)> {
        self.reads.borrow().clone()
    }
}

impl GeoArchiveReader for MemoryReader {
    fn list_layers(&self, _path: &Utf8Path) -> Result<Vec<String>, ReadError> {
        Ok(self.layers.iter().map(|layer| layer.layer.clone()).collect())
    }

    fn read_layer(&self, path: &Utf8Path, layer: &str) -> Result<SpatialDataset, ReadError> {
        self.reads
            .borrow_mut()
            .push((path.to_path_buf(), layer.to_owned()));
        self.layers
            .iter()
            .find(|candidate| candidate.layer == layer)
            .cloned()
            .ok_or_else(|| ReadError::LayerNotFound {
                path: path.to_path_buf(),
                layer: layer.to_owned(),
            })
    }
}
