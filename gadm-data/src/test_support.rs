//! Deterministic collaborators and on-disk fixtures for fetch tests.
//!
//! [`StubSource`] serves canned archive bytes by URL and [`RecordingExtractor`]
//! remembers which archive files it was handed, so tests can check that the
//! temporary download is gone once a fetch returns. The fixture builders write
//! small but genuine GeoPackages, shapefiles and ZIP archives.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Write};

use camino::{Utf8Path, Utf8PathBuf};
use gadm_core::{ArchiveUrl, BoxedSource, geopackage_filename, layer_filename};
use geo::{MultiPolygon, polygon};
use rusqlite::Connection;
use rusqlite_gpkg::{ColumnSpec, ColumnType, Dimension, GeometryType, Gpkg, params};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::archive::{ArchiveError, ArchiveExtractor};
use crate::source::{ArchiveSource, TransportError};

const WGS84_WKT: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",\
SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]";

#[derive(Debug, Clone)]
enum StubResponse {
    Archive(Vec<u8>),
    Interrupted(Vec<u8>),
}

/// `ArchiveSource` answering from an in-memory URL table.
///
/// Unknown URLs fail with HTTP 404, mirroring a missing country on the
/// archive host.
///
/// # Examples
/// ```
/// use gadm_core::ArchiveUrl;
/// use gadm_data::source::ArchiveSource;
/// use gadm_data::test_support::StubSource;
///
/// let url = ArchiveUrl::new("https://example.test/a.zip");
/// let source = StubSource::new().with_archive(url.clone(), b"PK".to_vec());
/// let mut sink = Vec::new();
/// assert_eq!(source.download_archive(&url, &mut sink).ok(), Some(2));
/// assert_eq!(source.requested(), vec![url.to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct StubSource {
    responses: HashMap<String, StubResponse>,
    requested: RefCell<Vec<String>>,
}

impl StubSource {
    /// Source with no archives.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `url`.
    #[must_use]
    pub fn with_archive(mut self, url: ArchiveUrl, bytes: Vec<u8>) -> Self {
        self.responses
            .insert(url.into_inner(), StubResponse::Archive(bytes));
        self
    }

    /// Write `partial` for `url`, then fail as if the connection dropped.
    #[must_use]
    pub fn with_interrupted(mut self, url: ArchiveUrl, partial: Vec<u8>) -> Self {
        self.responses
            .insert(url.into_inner(), StubResponse::Interrupted(partial));
        self
    }

    /// URLs requested so far, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl ArchiveSource for StubSource {
    fn download_archive(
        &self,
        url: &ArchiveUrl,
        sink: &mut dyn Write,
    ) -> Result<u64, TransportError> {
        self.requested.borrow_mut().push(url.to_string());
        let network = |source: io::Error| TransportError::Network {
            url: url.to_string(),
            source,
        };
        match self.responses.get(url.as_ref()) {
            Some(StubResponse::Archive(bytes)) => {
                sink.write_all(bytes).map_err(network)?;
                Ok(bytes.len() as u64)
            }
            Some(StubResponse::Interrupted(partial)) => {
                sink.write_all(partial).map_err(network)?;
                Err(network(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )))
            }
            None => Err(TransportError::Http {
                url: url.to_string(),
                status: 404,
                message: "Not Found".to_owned(),
            }),
        }
    }
}

/// Extractor wrapper recording every archive path it is given and whether
/// the file existed at that moment.
#[derive(Debug, Default)]
pub struct RecordingExtractor<X> {
    inner: X,
    archives: RefCell<Vec<(Utf8PathBuf, bool)>>,
}

impl<X> RecordingExtractor<X> {
    /// Wrap `inner`.
    pub const fn new(inner: X) -> Self {
        Self {
            inner,
            archives: RefCell::new(Vec::new()),
        }
    }

    /// `(archive path, existed during extraction)` pairs, in call order.
    pub fn archives(&self) -> Vec<(Utf8PathBuf, bool)> {
        self.archives.borrow().clone()
    }
}

impl<X: ArchiveExtractor> ArchiveExtractor for RecordingExtractor<X> {
    fn extract(
        &self,
        archive: &Utf8Path,
        destination: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>, ArchiveError> {
        let present = archive.is_file();
        self.archives
            .borrow_mut()
            .push((archive.to_path_buf(), present));
        self.inner.extract(archive, destination)
    }
}

/// Extractor that always fails after touching nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingExtractor;

impl ArchiveExtractor for FailingExtractor {
    fn extract(
        &self,
        _archive: &Utf8Path,
        destination: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>, ArchiveError> {
        Err(ArchiveError::Write {
            path: destination.to_path_buf(),
            source: io::Error::other("no space left on device"),
        })
    }
}

/// Build a ZIP archive holding `entries` as `(name, contents)` pairs.
///
/// Names are stored verbatim, so unsafe names such as `../x` can be used to
/// exercise extraction guards.
///
/// # Errors
///
/// Returns the `zip` writer's error if an entry cannot be written.
pub fn zip_entries(entries: &[(&str, &[u8])]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(contents)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// One feature table for [`GeoPackageFixture`].
#[derive(Debug, Clone)]
pub struct FixtureLayer {
    name: String,
    rows: Vec<(MultiPolygon<f64>, String)>,
}

/// A layer named `name` with `count` square features named `"{name} #{n}"`.
pub fn fixture_layer(name: &str, count: u32) -> FixtureLayer {
    let rows = (0..count)
        .map(|index| {
            let x = f64::from(index);
            let square = polygon![
                (x: x, y: 0.0),
                (x: x + 1.0, y: 0.0),
                (x: x + 1.0, y: 1.0),
                (x: x, y: 1.0),
            ];
            (MultiPolygon::new(vec![square]), format!("{name} #{index}"))
        })
        .collect();
    FixtureLayer {
        name: name.to_owned(),
        rows,
    }
}

impl FixtureLayer {
    /// Layer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the layer has no features.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Writes a GeoPackage through `rusqlite-gpkg`: one EPSG:4326 feature table
/// per layer, registered in insertion order, plus an attribute-only `notes`
/// table that readers must not report as a layer.
#[derive(Debug, Clone, Default)]
pub struct GeoPackageFixture {
    layers: Vec<FixtureLayer>,
}

impl GeoPackageFixture {
    /// Empty package.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a feature table.
    #[must_use]
    pub fn with_layer(mut self, layer: FixtureLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Write the package to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite fails or a geometry cannot be encoded.
    pub fn write(&self, path: &Utf8Path) -> Result<(), BoxedSource> {
        let package = Gpkg::open(path.as_str())?;
        for layer in &self.layers {
            write_layer(&package, layer)?;
        }
        drop(package);

        let connection = Connection::open(path)?;
        connection.execute_batch(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);
             INSERT INTO gpkg_contents (table_name, data_type, identifier)
                 VALUES ('notes', 'attributes', 'notes');",
        )?;
        Ok(())
    }
}

fn write_layer(package: &Gpkg, layer: &FixtureLayer) -> Result<(), BoxedSource> {
    let columns = ["GID_0", "NAME"].map(|name| ColumnSpec {
        name: name.to_owned(),
        column_type: ColumnType::Varchar,
    });
    let table = package.create_layer(
        &layer.name,
        "geom",
        GeometryType::MultiPolygon,
        Dimension::Xy,
        4326,
        &columns,
    )?;
    let country = layer.name.split('_').nth(1).unwrap_or_default();
    for (shape, name) in &layer.rows {
        table.insert(shape, params![country, name.as_str()])?;
    }
    Ok(())
}

/// Write `{dir}/{layer}.shp` (with `.shx`, `.dbf` and `.prj`) holding one
/// point per entry in `names`, stored in a `NAME` attribute.
///
/// # Errors
///
/// Returns an error if any of the files cannot be written.
pub fn write_shapefile_layer(
    dir: &Utf8Path,
    layer: &str,
    names: &[&str],
) -> Result<(), BoxedSource> {
    let table = TableWriterBuilder::new().add_character_field(FieldName::try_from("NAME")?, 64);
    {
        let mut writer = shapefile::Writer::from_path(dir.join(format!("{layer}.shp")), table)?;
        for (index, name) in (0_u32..).zip(names) {
            let point = shapefile::Point::new(60.0 + f64::from(index), 33.0);
            let mut record = Record::default();
            record.insert(
                "NAME".to_owned(),
                FieldValue::Character(Some((*name).to_owned())),
            );
            writer.write_shape_and_record(&point, &record)?;
        }
    }
    fs::write(dir.join(format!("{layer}.prj")), WGS84_WKT)?;
    Ok(())
}

/// ZIP archive laid out like a GADM GeoPackage download: one
/// `{nodots}_{country}.gpkg` plus a licence file.
///
/// # Errors
///
/// Returns an error if the package or the archive cannot be written.
pub fn geopackage_archive(
    version: &str,
    country: &str,
    layers: impl IntoIterator<Item = FixtureLayer>,
) -> Result<Vec<u8>, BoxedSource> {
    let scratch = tempfile::tempdir()?;
    let path = Utf8PathBuf::from_path_buf(scratch.path().join("package.gpkg"))
        .map_err(|_| io::Error::other("temporary directory is not UTF-8"))?;
    layers
        .into_iter()
        .fold(GeoPackageFixture::new(), GeoPackageFixture::with_layer)
        .write(&path)?;
    let bytes = fs::read(&path)?;
    let name = geopackage_filename(version, country);
    Ok(zip_entries(&[
        (name.as_str(), bytes.as_slice()),
        ("license.txt", b"Freely available for academic use.".as_slice()),
    ])?)
}

/// ZIP archive laid out like a GADM shapefile download: one file set per
/// administrative level, `{nodots}_{country}_{level}.*`.
///
/// `levels[n]` lists the feature names for level `n`.
///
/// # Errors
///
/// Returns an error if the shapefiles or the archive cannot be written.
pub fn shapefile_archive(
    version: &str,
    country: &str,
    levels: &[&[&str]],
) -> Result<Vec<u8>, BoxedSource> {
    let scratch = tempfile::tempdir()?;
    let root = Utf8PathBuf::from_path_buf(scratch.path().to_path_buf())
        .map_err(|_| io::Error::other("temporary directory is not UTF-8"))?;
    for (level, names) in levels.iter().enumerate() {
        write_shapefile_layer(&root, &layer_filename(version, country, level), names)?;
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| io::Error::other("fixture file name is not UTF-8"))?;
        files.push((name, fs::read(entry.path())?));
    }
    files.sort();
    let entries: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .collect();
    Ok(zip_entries(&entries)?)
}
