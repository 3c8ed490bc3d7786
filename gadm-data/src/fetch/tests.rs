//! Unit tests for the fetch pipeline.

mod behaviour;

use super::*;
use crate::archive::ZipExtractor;
use crate::source::TransportError;
use crate::test_support::{
    RecordingExtractor, StubSource, fixture_layer, geopackage_archive, shapefile_archive,
    zip_entries,
};
use gadm_core::test_support::MemoryReader;
use gadm_core::{LayerOutOfRange, ReadError};
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

type StubFetcher<R> = MapFetcher<StubSource, RecordingExtractor<ZipExtractor>, R>;

const COUNTRY: &str = "AFG";
const VERSION: &str = "gadm3.6";

struct Scratch {
    _guard: TempDir,
    root: Utf8PathBuf,
}

impl Scratch {
    fn entries(&self) -> usize {
        fs::read_dir(&self.root).map_or(0, Iterator::count)
    }
}

fn new_scratch() -> Scratch {
    let guard = TempDir::new().expect("failed to create temporary directory");
    let root = Utf8PathBuf::from_path_buf(guard.path().join("work"))
        .expect("temporary directory should be UTF-8");
    Scratch {
        _guard: guard,
        root,
    }
}

#[fixture]
fn scratch() -> Scratch {
    new_scratch()
}

fn country() -> CountryCode {
    CountryCode::from(COUNTRY)
}

fn version() -> DatasetVersion {
    DatasetVersion::from(VERSION)
}

/// Archive whose only content is an opaque `gadm36_AFG.gpkg`; pairs with
/// [`MemoryReader`], which never opens the file.
fn placeholder_geopackage() -> Vec<u8> {
    zip_entries(&[("gadm36_AFG.gpkg", b"placeholder".as_slice())]).expect("archive should build")
}

fn placeholder_shapefiles() -> Vec<u8> {
    zip_entries(&[
        ("gadm36_AFG_0.shp", b"placeholder".as_slice()),
        ("gadm36_AFG_1.shp", b"placeholder".as_slice()),
    ])
    .expect("archive should build")
}

fn fetcher<R: GeoArchiveReader>(
    source: StubSource,
    reader: R,
    scratch: &Scratch,
) -> StubFetcher<R> {
    MapFetcher::new(source, RecordingExtractor::new(ZipExtractor), reader)
        .with_scratch_root(scratch.root.clone())
}

fn native_layers() -> MemoryReader {
    MemoryReader::with_layer_names(["gadm36_AFG_2", "gadm36_AFG_1", "gadm36_AFG_0"])
}

#[rstest]
#[case(0, "gadm36_AFG_0")]
#[case(1, "gadm36_AFG_1")]
#[case(2, "gadm36_AFG_2")]
fn geopackage_levels_count_from_the_end_of_the_listing(
    scratch: Scratch,
    #[case] layer: usize,
    #[case] expected: &str,
) {
    let source = StubSource::new().with_archive(
        geopackage_url(COUNTRY, VERSION),
        placeholder_geopackage(),
    );
    let fetcher = fetcher(source, native_layers(), &scratch);

    let dataset = fetcher
        .fetch_geopackage(&country(), &version(), layer)
        .expect("fetch should succeed");

    assert_eq!(dataset.layer, expected);
    let reads = fetcher.reader().reads();
    let (path, name) = reads.first().expect("reader was called");
    assert_eq!(name, expected);
    assert_eq!(path.file_name(), Some("gadm36_AFG.gpkg"));
    assert_eq!(
        fetcher.source().requested(),
        vec!["https://biogeo.ucdavis.edu/data/gadm3.6/gpkg/gadm36_AFG_gpkg.zip"]
    );
}

#[rstest]
#[case(3)]
#[case(4)]
#[case(usize::MAX)]
fn geopackage_level_beyond_listing_is_rejected(scratch: Scratch, #[case] layer: usize) {
    let source = StubSource::new().with_archive(
        geopackage_url(COUNTRY, VERSION),
        placeholder_geopackage(),
    );
    let fetcher = fetcher(source, native_layers(), &scratch);

    let err = fetcher
        .fetch_geopackage(&country(), &version(), layer)
        .expect_err("layer is out of range");

    assert!(matches!(
        err,
        FetchError::LayerOutOfRange(LayerOutOfRange { requested, available: 3 }) if requested == layer
    ));
    let message = err.to_string();
    assert!(message.contains(&format!("layer {layer}")), "{message}");
    assert!(message.contains("[0, 3)"), "{message}");
    assert!(fetcher.reader().reads().is_empty());
    assert_eq!(scratch.entries(), 0);
}

#[rstest]
fn geopackage_missing_from_archive_is_reported(scratch: Scratch) {
    let archive = zip_entries(&[("gadm36_IRN.gpkg", b"wrong country".as_slice())])
        .expect("archive should build");
    let source = StubSource::new().with_archive(geopackage_url(COUNTRY, VERSION), archive);
    let fetcher = fetcher(source, native_layers(), &scratch);

    let err = fetcher
        .fetch_geopackage(&country(), &version(), 0)
        .expect_err("archive lacks the package");

    match err {
        FetchError::MissingDataset { path } => {
            assert_eq!(path.file_name(), Some("gadm36_AFG.gpkg"));
        }
        other => panic!("expected MissingDataset, got {other:?}"),
    }
}

#[rstest]
fn shapefile_layer_name_follows_naming_convention(scratch: Scratch) {
    let source = StubSource::new().with_archive(
        shapefile_url(COUNTRY, VERSION),
        placeholder_shapefiles(),
    );
    let reader = MemoryReader::with_layer_names(["gadm36_AFG_0", "gadm36_AFG_1"]);
    let fetcher = fetcher(source, reader, &scratch);

    let dataset = fetcher
        .fetch_shapefile(&country(), &version(), 1)
        .expect("fetch should succeed");

    assert_eq!(dataset.layer, "gadm36_AFG_1");
    let reads = fetcher.reader().reads();
    let (path, _) = reads.first().expect("reader was called");
    assert!(path.starts_with(&scratch.root));
    assert!(!path.exists());
    assert_eq!(
        fetcher.source().requested(),
        vec!["https://biogeo.ucdavis.edu/data/gadm3.6/shp/gadm36_AFG_shp.zip"]
    );
}

#[rstest]
fn shapefile_level_is_not_range_checked(scratch: Scratch) {
    let source = StubSource::new().with_archive(
        shapefile_url(COUNTRY, VERSION),
        placeholder_shapefiles(),
    );
    let reader = MemoryReader::with_layer_names(["gadm36_AFG_0", "gadm36_AFG_1"]);
    let fetcher = fetcher(source, reader, &scratch);

    let err = fetcher
        .fetch_shapefile(&country(), &version(), 5)
        .expect_err("level 5 does not exist");

    assert!(matches!(
        err,
        FetchError::Read {
            source: ReadError::LayerNotFound { ref layer, .. }
        } if layer == "gadm36_AFG_5"
    ));
    assert_eq!(fetcher.reader().reads().len(), 1);
}

#[rstest]
fn download_failure_propagates_and_leaves_nothing(scratch: Scratch) {
    let fetcher = fetcher(StubSource::new(), native_layers(), &scratch);

    let err = fetcher
        .fetch_geopackage(&country(), &version(), 0)
        .expect_err("no archive is served");

    assert!(matches!(
        err,
        FetchError::Download {
            source: TransportError::Http { status: 404, .. }
        }
    ));
    assert!(fetcher.extractor().archives().is_empty());
    assert_eq!(scratch.entries(), 0);
}

#[rstest]
#[case::success(0)]
#[case::out_of_range(9)]
fn downloaded_archive_never_outlives_the_call(scratch: Scratch, #[case] layer: usize) {
    let source = StubSource::new().with_archive(
        geopackage_url(COUNTRY, VERSION),
        placeholder_geopackage(),
    );
    let fetcher = fetcher(source, native_layers(), &scratch);

    let _ = fetcher.fetch_geopackage(&country(), &version(), layer);

    let archives = fetcher.extractor().archives();
    let (archive, existed) = archives.first().expect("extractor was called");
    assert!(existed, "archive should exist while it is extracted");
    assert!(!archive.exists(), "archive should be removed afterwards");
    assert_eq!(scratch.entries(), 0);
}

#[rstest]
fn concurrent_style_calls_use_distinct_work_directories(scratch: Scratch) {
    let source = StubSource::new().with_archive(
        shapefile_url(COUNTRY, VERSION),
        placeholder_shapefiles(),
    );
    let reader = MemoryReader::with_layer_names(["gadm36_AFG_0"]);
    let fetcher = fetcher(source, reader, &scratch);

    for _ in 0..2 {
        fetcher
            .fetch_shapefile(&country(), &version(), 0)
            .expect("fetch should succeed");
    }

    let reads = fetcher.reader().reads();
    let dirs: Vec<_> = reads.iter().map(|(path, _)| path.clone()).collect();
    assert_eq!(dirs.len(), 2);
    assert_ne!(dirs.first(), dirs.last());
}

#[rstest]
fn empty_format_set_is_rejected(scratch: Scratch) {
    let fetcher = fetcher(StubSource::new(), native_layers(), &scratch);

    let err = fetcher
        .fetch_map(MapFormats::default(), &country(), &version(), 0)
        .expect_err("no format requested");

    assert!(matches!(err, FetchError::NoFormatRequested));
    assert!(fetcher.source().requested().is_empty());
}

#[rstest]
fn shapefile_failure_aborts_combined_fetch(scratch: Scratch) {
    let source = StubSource::new().with_archive(
        geopackage_url(COUNTRY, VERSION),
        placeholder_geopackage(),
    );
    let fetcher = fetcher(source, native_layers(), &scratch);
    let both = MapFormats::only(MapFormat::Shapefile).with(MapFormat::GeoPackage);

    let err = fetcher
        .fetch_map(both, &country(), &version(), 0)
        .expect_err("shapefile archive is missing");

    assert!(matches!(err, FetchError::Download { .. }));
    assert_eq!(
        fetcher.source().requested(),
        vec!["https://biogeo.ucdavis.edu/data/gadm3.6/shp/gadm36_AFG_shp.zip"]
    );
}

/// Genuine GeoPackage and shapefile archives for Afghanistan, levels 0
/// and 1, with the package listing its layers finest first.
fn afghanistan_archives() -> StubSource {
    let gpkg = geopackage_archive(
        VERSION,
        COUNTRY,
        [
            fixture_layer("gadm36_AFG_1", 34),
            fixture_layer("gadm36_AFG_0", 1),
        ],
    )
    .expect("GeoPackage archive should build");
    let shp = shapefile_archive(VERSION, COUNTRY, &[&["Afghanistan"], &["Badakhshan", "Badghis"]])
        .expect("shapefile archive should build");
    StubSource::new()
        .with_archive(geopackage_url(COUNTRY, VERSION), gpkg)
        .with_archive(shapefile_url(COUNTRY, VERSION), shp)
}

#[fixture]
fn real_archives() -> StubSource {
    afghanistan_archives()
}

#[rstest]
fn combined_fetch_returns_the_geopackage_result(scratch: Scratch, real_archives: StubSource) {
    let fetcher = fetcher(real_archives, VectorReader::new(), &scratch);
    let both: MapFormats = [MapFormat::GeoPackage, MapFormat::Shapefile]
        .into_iter()
        .collect();

    let combined = fetcher
        .fetch_map(both, &country(), &version(), 1)
        .expect("combined fetch should succeed");
    let geopackage = fetcher
        .fetch_geopackage(&country(), &version(), 1)
        .expect("GeoPackage fetch should succeed");

    assert_eq!(combined, geopackage);
    assert_eq!(combined.layer, "gadm36_AFG_1");
    assert_eq!(combined.len(), 34);
    assert_eq!(combined.srs.as_deref(), Some("EPSG:4326"));
    assert_eq!(
        fetcher.source().requested(),
        vec![
            shapefile_url(COUNTRY, VERSION).into_inner(),
            geopackage_url(COUNTRY, VERSION).into_inner(),
            geopackage_url(COUNTRY, VERSION).into_inner(),
        ]
    );
    assert_eq!(scratch.entries(), 0);
}

#[rstest]
fn request_drives_the_shapefile_reader(scratch: Scratch, real_archives: StubSource) {
    let fetcher = fetcher(real_archives, VectorReader::new(), &scratch);
    let request = MapRequest::new("AFG")
        .with_formats(MapFormat::Shapefile)
        .with_layer(1);

    let dataset = fetcher.fetch(&request).expect("fetch should succeed");

    assert_eq!(dataset.layer, "gadm36_AFG_1");
    assert_eq!(dataset.len(), 2);
    assert!(dataset.srs.as_deref().is_some_and(|wkt| wkt.starts_with("GEOGCS")));
    assert_eq!(scratch.entries(), 0);
}
