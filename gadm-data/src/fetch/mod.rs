//! Fetch pipeline: resolve a request to an archive URL, download and unpack
//! it into a private work directory, then read one administrative layer.

mod scratch;

#[cfg(test)]
mod tests;

use camino::{Utf8Path, Utf8PathBuf};
use gadm_core::{
    ArchiveUrl, CountryCode, DatasetVersion, GeoArchiveReader, LayerOrder, MapFormat, MapFormats,
    MapRequest, SpatialDataset, geopackage_filename, geopackage_url, layer_filename,
    shapefile_url,
};
use log::{debug, info};

use self::scratch::WorkDir;
use crate::archive::{ArchiveExtractor, ZipExtractor};
use crate::error::FetchError;
use crate::reader::VectorReader;
use crate::source::{ArchiveSource, HttpArchiveSource, HttpArchiveSourceConfig, SourceBuildError};

/// Order in which GADM GeoPackages list their layers.
pub const GEOPACKAGE_LAYER_ORDER: LayerOrder = LayerOrder::CoarsestLast;

/// Downloads GADM archives and parses one layer from them.
///
/// Every call works in its own temporary directory, created under the
/// scratch root (the system temp directory unless overridden), so concurrent
/// fetches never share extracted files. The directory and the downloaded
/// archive are removed before the call returns.
///
/// # Examples
/// ```
/// use gadm_core::{CountryCode, DatasetVersion, geopackage_url};
/// use gadm_core::test_support::MemoryReader;
/// use gadm_data::MapFetcher;
/// use gadm_data::test_support::{StubSource, zip_entries};
/// use gadm_data::archive::ZipExtractor;
///
/// let archive = zip_entries(&[("gadm36_AFG.gpkg", b"stub".as_slice())])?;
/// let source = StubSource::new().with_archive(geopackage_url("AFG", "gadm3.6"), archive);
/// let reader = MemoryReader::with_layer_names(["gadm36_AFG_1", "gadm36_AFG_0"]);
/// let fetcher = MapFetcher::new(source, ZipExtractor, reader);
///
/// let dataset = fetcher.fetch_geopackage(
///     &CountryCode::from("AFG"),
///     &DatasetVersion::default(),
///     0,
/// )?;
/// assert_eq!(dataset.layer, "gadm36_AFG_0");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct MapFetcher<S, X, R> {
    source: S,
    extractor: X,
    reader: R,
    scratch_root: Option<Utf8PathBuf>,
}

impl MapFetcher<HttpArchiveSource, ZipExtractor, VectorReader> {
    /// Production wiring: HTTP downloads, ZIP extraction and the
    /// GeoPackage/shapefile readers.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or its runtime cannot be built.
    pub fn http(config: HttpArchiveSourceConfig) -> Result<Self, SourceBuildError> {
        let source = HttpArchiveSource::with_config(config)?;
        Ok(Self::new(source, ZipExtractor, VectorReader::new()))
    }
}

impl<S, X, R> MapFetcher<S, X, R>
where
    S: ArchiveSource,
    X: ArchiveExtractor,
    R: GeoArchiveReader,
{
    /// Assemble a fetcher from its collaborators.
    pub const fn new(source: S, extractor: X, reader: R) -> Self {
        Self {
            source,
            extractor,
            reader,
            scratch_root: None,
        }
    }

    /// Create per-call work directories under `root` instead of the system
    /// temp directory. The root is created on first use.
    #[must_use]
    pub fn with_scratch_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Directory work directories are created in, when overridden.
    pub fn scratch_root(&self) -> Option<&Utf8Path> {
        self.scratch_root.as_deref()
    }

    /// Archive source in use.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Archive extractor in use.
    pub const fn extractor(&self) -> &X {
        &self.extractor
    }

    /// Dataset reader in use.
    pub const fn reader(&self) -> &R {
        &self.reader
    }

    fn unpack(&self, url: &ArchiveUrl) -> Result<WorkDir, FetchError> {
        let work = WorkDir::create(self.scratch_root())?;
        work.unpack(&self.source, &self.extractor, url)?;
        Ok(work)
    }

    /// Fetch administrative level `layer` of `country` from the GeoPackage
    /// distribution.
    ///
    /// Level 0 is the last layer the reader lists (see
    /// [`GEOPACKAGE_LAYER_ORDER`]).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::LayerOutOfRange`] when `layer` is not below the
    /// number of layers in the package, and propagates download, extraction
    /// and read failures.
    pub fn fetch_geopackage(
        &self,
        country: &CountryCode,
        version: &DatasetVersion,
        layer: usize,
    ) -> Result<SpatialDataset, FetchError> {
        let url = geopackage_url(country, version);
        info!("fetching {country} {version} layer {layer} as GeoPackage from {url}");
        let work = self.unpack(&url)?;

        let dataset = work.path().join(geopackage_filename(version, country));
        let present = gadm_fs::file_is_file(&dataset).map_err(|source| FetchError::Scratch {
            path: dataset.clone().into_std_path_buf(),
            source,
        })?;
        if !present {
            return Err(FetchError::MissingDataset { path: dataset });
        }

        let layers = self.reader.list_layers(&dataset)?;
        let name = GEOPACKAGE_LAYER_ORDER.resolve(&layers, layer)?;
        debug!("level {layer} of {} layers resolves to {name}", layers.len());
        let parsed = self.reader.read_layer(&dataset, name)?;
        info!("read {} features from {name}", parsed.len());
        Ok(parsed)
    }

    /// Fetch administrative level `layer` of `country` from the shapefile
    /// distribution.
    ///
    /// The layer name is derived from the GADM file naming convention and is
    /// not checked against the archive contents; a level the archive lacks
    /// surfaces as the reader's error.
    ///
    /// # Errors
    ///
    /// Propagates download, extraction and read failures.
    pub fn fetch_shapefile(
        &self,
        country: &CountryCode,
        version: &DatasetVersion,
        layer: usize,
    ) -> Result<SpatialDataset, FetchError> {
        let url = shapefile_url(country, version);
        info!("fetching {country} {version} layer {layer} as shapefile from {url}");
        let work = self.unpack(&url)?;

        let name = layer_filename(version, country, layer);
        let parsed = self.reader.read_layer(work.path(), &name)?;
        info!("read {} features from {name}", parsed.len());
        Ok(parsed)
    }

    /// Fetch in every requested format and return the last result.
    ///
    /// The shapefile runs first and the GeoPackage second, so when both are
    /// requested the GeoPackage result is returned. A shapefile failure
    /// still aborts the call.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NoFormatRequested`] for an empty format set and
    /// otherwise whatever the individual fetches return.
    pub fn fetch_map(
        &self,
        formats: impl Into<MapFormats>,
        country: &CountryCode,
        version: &DatasetVersion,
        layer: usize,
    ) -> Result<SpatialDataset, FetchError> {
        let formats = formats.into();
        let mut result = None;
        if formats.contains(MapFormat::Shapefile) {
            result = Some(self.fetch_shapefile(country, version, layer)?);
        }
        if formats.contains(MapFormat::GeoPackage) {
            result = Some(self.fetch_geopackage(country, version, layer)?);
        }
        result.ok_or(FetchError::NoFormatRequested)
    }

    /// [`Self::fetch_map`] driven by a [`MapRequest`].
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_map`].
    pub fn fetch(&self, request: &MapRequest) -> Result<SpatialDataset, FetchError> {
        self.fetch_map(
            request.formats,
            &request.country,
            &request.version,
            request.layer,
        )
    }
}
