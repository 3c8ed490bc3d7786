//! GeoPackage reader backed by `rusqlite-gpkg`.

use camino::Utf8Path;
use gadm_core::{Feature, GeoArchiveReader, PropertyValue, ReadError, SpatialDataset};
use geo::Geometry;
use geo_traits::to_geo::ToGeoGeometry;
use log::debug;
use rusqlite::types::Type;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use rusqlite_gpkg::{ColumnType, Gpkg, GpkgError, GpkgFeature, Value};

const LIST_LAYERS_SQL: &str =
    "SELECT table_name FROM gpkg_contents WHERE data_type = 'features' ORDER BY rowid";

const LAYER_SRS_SQL: &str = "SELECT s.organization, s.organization_coordsys_id \
     FROM gpkg_geometry_columns g \
     LEFT JOIN gpkg_spatial_ref_sys s ON s.srs_id = g.srs_id \
     WHERE g.table_name = ?1";

/// Reads feature tables from a GeoPackage file.
///
/// Layers are listed in `gpkg_contents` insertion order. GADM packages are
/// written finest subdivision first, so the national outline comes last.
/// `rusqlite_gpkg::Gpkg::list_layers` makes no ordering promise, so the
/// listing query is issued directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoPackageReader;

struct LayerSrs {
    organization: Option<String>,
    coordsys_id: Option<i64>,
}

impl LayerSrs {
    fn label(&self) -> Option<String> {
        match (&self.organization, self.coordsys_id) {
            (Some(org), Some(id)) if !org.eq_ignore_ascii_case("none") => {
                Some(format!("{}:{id}", org.to_ascii_uppercase()))
            }
            _ => None,
        }
    }
}

fn open(path: &Utf8Path) -> Result<Connection, ReadError> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|source| {
        ReadError::Open {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    })
}

fn layer_srs(connection: &Connection, layer: &str) -> rusqlite::Result<Option<LayerSrs>> {
    connection
        .query_row(LAYER_SRS_SQL, [layer], |row| {
            Ok(LayerSrs {
                organization: row.get(0)?,
                coordsys_id: row.get(1)?,
            })
        })
        .optional()
}

fn property_value(value: Value, column_type: ColumnType) -> PropertyValue {
    match (value, column_type) {
        (Value::Integer(flag), ColumnType::Boolean) => PropertyValue::Boolean(flag != 0),
        (Value::Null, _) => PropertyValue::Null,
        (Value::Integer(number), _) => PropertyValue::Integer(number),
        (Value::Real(number), _) => PropertyValue::Real(number),
        (Value::Text(text), _) => PropertyValue::Text(text),
        (Value::Blob(bytes) | Value::Geometry(bytes), _) => PropertyValue::Blob(bytes),
    }
}

/// Decode a feature's geometry. Null and empty geometries yield `None`.
fn feature_geometry(
    record: &GpkgFeature,
    layer: &str,
) -> Result<Option<Geometry<f64>>, ReadError> {
    match record.geometry() {
        Ok(wkb) => Ok(wkb.try_to_geometry()),
        Err(GpkgError::Sql(rusqlite::Error::InvalidColumnType(_, _, Type::Null))) => Ok(None),
        Err(err) => Err(ReadError::Geometry {
            layer: layer.to_owned(),
            message: err.to_string(),
        }),
    }
}

impl GeoArchiveReader for GeoPackageReader {
    fn list_layers(&self, path: &Utf8Path) -> Result<Vec<String>, ReadError> {
        let connection = open(path)?;
        let list_error = |source: rusqlite::Error| ReadError::ListLayers {
            path: path.to_path_buf(),
            source: Box::new(source),
        };
        let mut statement = connection.prepare(LIST_LAYERS_SQL).map_err(list_error)?;
        let layers = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(list_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(list_error)?;
        debug!("{path} lists {} feature layers", layers.len());
        Ok(layers)
    }

    fn read_layer(&self, path: &Utf8Path, layer: &str) -> Result<SpatialDataset, ReadError> {
        let query_error = |source: GpkgError| ReadError::Query {
            layer: layer.to_owned(),
            source: Box::new(source),
        };

        let srs = layer_srs(&open(path)?, layer)
            .map_err(|source| query_error(source.into()))?
            .ok_or_else(|| ReadError::LayerNotFound {
                path: path.to_path_buf(),
                layer: layer.to_owned(),
            })?;

        let package = Gpkg::open_read_only(path.as_str()).map_err(|source| ReadError::Open {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        let table = package.get_layer(layer).map_err(query_error)?;
        let records = table.features().map_err(query_error)?;

        let mut features = Vec::with_capacity(records.len());
        for record in &records {
            let mut feature = Feature {
                id: Some(record.id()),
                geometry: feature_geometry(record, layer)?,
                ..Feature::default()
            };
            for column in &table.property_columns {
                let value = record
                    .property(&column.name)
                    .map_or(PropertyValue::Null, |value| {
                        property_value(value, column.column_type)
                    });
                feature.properties.insert(column.name.clone(), value);
            }
            features.push(feature);
        }

        debug!("read {} features from {path} layer {layer}", features.len());
        Ok(SpatialDataset {
            layer: layer.to_owned(),
            srs: srs.label(),
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{GeoPackageFixture, fixture_layer};
    use camino::Utf8PathBuf;
    use geo::{BoundingRect, coord};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn gpkg() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("failed to create temporary directory");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("gadm36_AFG.gpkg"))
            .expect("temporary directory should be UTF-8");
        GeoPackageFixture::new()
            .with_layer(fixture_layer("gadm36_AFG_2", 3))
            .with_layer(fixture_layer("gadm36_AFG_1", 2))
            .with_layer(fixture_layer("gadm36_AFG_0", 1))
            .write(&path)
            .expect("fixture should be written");
        (dir, path)
    }

    #[rstest]
    fn lists_layers_in_insertion_order(gpkg: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = gpkg;
        let layers = GeoPackageReader
            .list_layers(&path)
            .expect("layers should list");
        assert_eq!(layers, vec!["gadm36_AFG_2", "gadm36_AFG_1", "gadm36_AFG_0"]);
    }

    #[rstest]
    fn reads_features_with_ids_and_properties(gpkg: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = gpkg;
        let dataset = GeoPackageReader
            .read_layer(&path, "gadm36_AFG_2")
            .expect("layer should read");
        assert_eq!(dataset.layer, "gadm36_AFG_2");
        assert_eq!(dataset.srs.as_deref(), Some("EPSG:4326"));
        assert_eq!(dataset.len(), 3);
        let ids: Vec<_> = dataset.features.iter().map(|feature| feature.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        let first = dataset.features.first().expect("features present");
        assert!(first.geometry.is_some());
        assert_eq!(
            first.property("GID_0"),
            Some(&PropertyValue::Text("AFG".to_owned()))
        );
        assert!(first.property("geom").is_none());
        assert!(first.property("fid").is_none());
    }

    #[rstest]
    fn unknown_layer_is_reported(gpkg: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = gpkg;
        let err = GeoPackageReader
            .read_layer(&path, "gadm36_AFG_9")
            .expect_err("layer does not exist");
        assert!(matches!(err, ReadError::LayerNotFound { layer, .. } if layer == "gadm36_AFG_9"));
    }

    #[rstest]
    fn missing_file_fails_to_open() {
        let dir = TempDir::new().expect("failed to create temporary directory");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.gpkg"))
            .expect("temporary directory should be UTF-8");
        let err = GeoPackageReader
            .list_layers(&path)
            .expect_err("file does not exist");
        assert!(matches!(err, ReadError::Open { .. }));
    }

    #[rstest]
    fn decodes_multipolygon_geometries(gpkg: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = gpkg;
        let dataset = GeoPackageReader
            .read_layer(&path, "gadm36_AFG_1")
            .expect("layer should read");
        let second = dataset.features.get(1).expect("two features present");
        let Some(Geometry::MultiPolygon(shape)) = &second.geometry else {
            panic!("expected a multipolygon, got {:?}", second.geometry);
        };
        let bounds = shape.bounding_rect().expect("non-empty shape");
        assert_eq!(bounds.min(), coord! { x: 1.0, y: 0.0 });
        assert_eq!(bounds.max(), coord! { x: 2.0, y: 1.0 });
    }

    #[rstest]
    fn null_geometries_are_absent(gpkg: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = gpkg;
        Connection::open(&path)
            .and_then(|connection| {
                connection.execute("UPDATE \"gadm36_AFG_2\" SET geom = NULL WHERE fid = 3", [])
            })
            .expect("geometry should be cleared");
        let dataset = GeoPackageReader
            .read_layer(&path, "gadm36_AFG_2")
            .expect("layer should read");
        let last = dataset.features.last().expect("features present");
        assert_eq!(last.id, Some(3));
        assert!(last.geometry.is_none());
        assert_eq!(
            last.property("NAME"),
            Some(&PropertyValue::Text("gadm36_AFG_2 #2".to_owned()))
        );
    }
}
