//! Behaviour scenarios for fetching country maps through stubbed archives.

use super::*;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

type RealFetcher = StubFetcher<VectorReader>;

struct FetchWorld {
    scratch: Scratch,
    fetcher: RefCell<Option<RealFetcher>>,
    outcome: RefCell<Option<Result<SpatialDataset, FetchError>>>,
}

impl FetchWorld {
    fn install(&self, source: StubSource) {
        let fetcher = fetcher(source, VectorReader::new(), &self.scratch);
        self.fetcher.replace(Some(fetcher));
    }

    fn run(&self, call: impl FnOnce(&RealFetcher) -> Result<SpatialDataset, FetchError>) {
        let guard = self.fetcher.borrow();
        let fetcher = guard.as_ref().expect("archive host must be configured");
        self.outcome.replace(Some(call(fetcher)));
    }

    fn with_dataset(&self, check: impl FnOnce(&SpatialDataset)) {
        let guard = self.outcome.borrow();
        let outcome = guard.as_ref().expect("a fetch must have run");
        match outcome {
            Ok(dataset) => check(dataset),
            Err(err) => panic!("expected a dataset, got {err}"),
        }
    }

    fn with_error(&self, check: impl FnOnce(&FetchError)) {
        let guard = self.outcome.borrow();
        let outcome = guard.as_ref().expect("a fetch must have run");
        match outcome {
            Ok(dataset) => panic!("expected a failure, got layer {}", dataset.layer),
            Err(err) => check(err),
        }
    }
}

#[fixture]
fn world() -> FetchWorld {
    FetchWorld {
        scratch: new_scratch(),
        fetcher: RefCell::new(None),
        outcome: RefCell::new(None),
    }
}

#[given("a GADM archive host serving Afghanistan in both formats")]
fn host_with_archives(world: &FetchWorld) {
    world.install(afghanistan_archives());
}

#[given("a GADM archive host with no archives")]
fn empty_host(world: &FetchWorld) {
    world.install(StubSource::new());
}

#[when("I fetch level {level} of Afghanistan as a GeoPackage")]
fn fetch_geopackage_level(world: &FetchWorld, level: usize) {
    world.run(|fetcher| fetcher.fetch_geopackage(&country(), &version(), level));
}

#[when("I fetch level {level} of Afghanistan as a shapefile")]
fn fetch_shapefile_level(world: &FetchWorld, level: usize) {
    world.run(|fetcher| fetcher.fetch_shapefile(&country(), &version(), level));
}

#[when("I fetch level {level} of Afghanistan in both formats")]
fn fetch_both(world: &FetchWorld, level: usize) {
    let both = MapFormats::only(MapFormat::GeoPackage).with(MapFormat::Shapefile);
    world.run(|fetcher| fetcher.fetch_map(both, &country(), &version(), level));
}

#[then("the dataset is the layer {layer}")]
fn dataset_layer(world: &FetchWorld, layer: String) {
    let expected = layer.trim_matches('"');
    world.with_dataset(|dataset| assert_eq!(dataset.layer, expected));
}

#[then("the dataset came from the GeoPackage")]
fn dataset_from_geopackage(world: &FetchWorld) {
    world.with_dataset(|dataset| {
        assert_eq!(dataset.srs.as_deref(), Some("EPSG:4326"));
        assert!(dataset.features.iter().all(|feature| feature.id.is_some()));
    });
}

#[then("both archives were downloaded")]
fn both_downloaded(world: &FetchWorld) {
    let guard = world.fetcher.borrow();
    let fetcher = guard.as_ref().expect("archive host must be configured");
    assert_eq!(
        fetcher.source().requested(),
        vec![
            shapefile_url(COUNTRY, VERSION).into_inner(),
            geopackage_url(COUNTRY, VERSION).into_inner(),
        ]
    );
}

#[then("the fetch fails because level {level} exceeds {count} layers")]
fn fails_out_of_range(world: &FetchWorld, level: usize, count: usize) {
    world.with_error(|err| match err {
        FetchError::LayerOutOfRange(range) => {
            assert_eq!(range.requested, level);
            assert_eq!(range.available, count);
        }
        other => panic!("expected an out-of-range error, got {other:?}"),
    });
}

#[then("the fetch fails with HTTP status {status}")]
fn fails_with_status(world: &FetchWorld, status: u16) {
    world.with_error(|err| match err {
        FetchError::Download {
            source: TransportError::Http { status: actual, .. },
        } => assert_eq!(*actual, status),
        other => panic!("expected an HTTP error, got {other:?}"),
    });
}

#[then("no scratch files remain")]
fn scratch_is_empty(world: &FetchWorld) {
    assert_eq!(world.scratch.entries(), 0);
}

#[scenario(path = "tests/features/fetch_map.feature", index = 0)]
fn national_boundary_from_geopackage(world: FetchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/fetch_map.feature", index = 1)]
fn geopackage_level_out_of_range(world: FetchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/fetch_map.feature", index = 2)]
fn shapefile_level_by_name(world: FetchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/fetch_map.feature", index = 3)]
fn geopackage_wins_over_shapefile(world: FetchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/fetch_map.feature", index = 4)]
fn download_failure(world: FetchWorld) {
    let _ = world;
}
