//! Reader for a directory of ESRI shapefiles.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Read};

use camino::{Utf8Path, Utf8PathBuf};
use gadm_core::{Feature, GeoArchiveReader, PropertyValue, ReadError, SpatialDataset};
use geo::Geometry;
use log::{debug, warn};
use shapefile::dbase::FieldValue;
use shapefile::{Reader, Shape};

/// Treats every `.shp` file in a directory as one layer named by its stem.
///
/// Listing is alphabetical; companion `.dbf` files supply attributes and an
/// optional `.prj` file supplies the spatial reference as WKT.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapefileReader;

fn layer_path(dir: &Utf8Path, layer: &str, extension: &str) -> Utf8PathBuf {
    dir.join(format!("{layer}.{extension}"))
}

fn read_projection(path: &Utf8Path) -> io::Result<Option<String>> {
    let mut file = match gadm_fs::open_utf8_file(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
}

fn property_value(value: FieldValue) -> PropertyValue {
    match value {
        FieldValue::Character(Some(text)) => PropertyValue::Text(text.trim_end().to_owned()),
        FieldValue::Memo(text) => PropertyValue::Text(text),
        FieldValue::Numeric(Some(number)) | FieldValue::Double(number) => {
            PropertyValue::Real(number)
        }
        FieldValue::Float(Some(number)) => PropertyValue::Real(f64::from(number)),
        FieldValue::Integer(number) => PropertyValue::Integer(i64::from(number)),
        FieldValue::Logical(Some(flag)) => PropertyValue::Boolean(flag),
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None) => PropertyValue::Null,
        other => PropertyValue::Text(format!("{other:?}")),
    }
}

fn geometry(shape: Shape, layer: &str) -> Result<Option<Geometry<f64>>, ReadError> {
    if matches!(shape, Shape::NullShape) {
        return Ok(None);
    }
    Geometry::<f64>::try_from(shape)
        .map(Some)
        .map_err(|err| ReadError::Geometry {
            layer: layer.to_owned(),
            message: err.to_string(),
        })
}

impl GeoArchiveReader for ShapefileReader {
    fn list_layers(&self, path: &Utf8Path) -> Result<Vec<String>, ReadError> {
        gadm_fs::file_stems_with_extension(path, "shp").map_err(|source| ReadError::ListLayers {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    fn read_layer(&self, path: &Utf8Path, layer: &str) -> Result<SpatialDataset, ReadError> {
        let shp = layer_path(path, layer, "shp");
        let present = gadm_fs::file_is_file(&shp).map_err(|source| ReadError::Open {
            path: shp.clone(),
            source: Box::new(source),
        })?;
        if !present {
            return Err(ReadError::LayerNotFound {
                path: path.to_path_buf(),
                layer: layer.to_owned(),
            });
        }

        let mut reader = Reader::from_path(&shp).map_err(|source| ReadError::Open {
            path: shp.clone(),
            source: Box::new(source),
        })?;
        let mut features = Vec::new();
        for (index, item) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = item.map_err(|source| ReadError::Query {
                layer: layer.to_owned(),
                source: Box::new(source),
            })?;
            let fields: HashMap<String, FieldValue> = record.into();
            let properties: BTreeMap<_, _> = fields
                .into_iter()
                .map(|(name, value)| (name, property_value(value)))
                .collect();
            features.push(Feature {
                id: i64::try_from(index).ok(),
                geometry: geometry(shape, layer)?,
                properties,
            });
        }

        let prj = layer_path(path, layer, "prj");
        let srs = read_projection(&prj).unwrap_or_else(|err| {
            warn!("ignoring unreadable projection file {prj}: {err}");
            None
        });
        debug!("read {} shapes from {shp}", features.len());
        Ok(SpatialDataset {
            layer: layer.to_owned(),
            srs,
            features,
        })
    }
}
