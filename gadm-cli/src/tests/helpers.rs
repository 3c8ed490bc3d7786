//! Stub fetcher wiring and scratch space shared by the CLI tests.

use super::*;
use crate::fetch::{FetchConfig, FetcherBuilder, MapSource};
use camino::Utf8PathBuf;
use gadm_core::{ArchiveUrl, geopackage_url, shapefile_url};
use gadm_data::MapFetcher;
use gadm_data::archive::ZipExtractor;
use gadm_data::reader::VectorReader;
use gadm_data::test_support::{
    StubSource, fixture_layer, geopackage_archive, shapefile_archive,
};
use std::cell::RefCell;
use tempfile::TempDir;

pub(super) struct Workspace {
    _guard: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let guard = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(guard.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            _guard: guard,
            root,
        }
    }

    pub(super) fn scratch_dir(&self) -> Utf8PathBuf {
        self.root.join("scratch")
    }

    pub(super) fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch_dir()).map_or(0, Iterator::count)
    }
}

/// Serves canned Afghanistan archives from memory instead of the network.
pub(super) struct StubFetcherBuilder {
    archives: Vec<(ArchiveUrl, Vec<u8>)>,
    pub(super) seen: RefCell<Vec<FetchConfig>>,
}

impl StubFetcherBuilder {
    pub(super) fn afghanistan() -> Self {
        let geopackage = geopackage_archive(
            "gadm3.6",
            "AFG",
            [
                fixture_layer("gadm36_AFG_1", 34),
                fixture_layer("gadm36_AFG_0", 1),
            ],
        )
        .expect("geopackage archive");
        let shapefiles = shapefile_archive(
            "gadm3.6",
            "AFG",
            &[&["Afghanistan"], &["Badakhshan", "Badghis", "Baghlan"]],
        )
        .expect("shapefile archive");
        Self {
            archives: vec![
                (geopackage_url("AFG", "gadm3.6"), geopackage),
                (shapefile_url("AFG", "gadm3.6"), shapefiles),
            ],
            seen: RefCell::new(Vec::new()),
        }
    }

    pub(super) fn empty() -> Self {
        Self {
            archives: Vec::new(),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl FetcherBuilder for StubFetcherBuilder {
    fn build(&self, config: &FetchConfig) -> Result<Box<dyn MapSource>, CliError> {
        self.seen.borrow_mut().push(config.clone());
        let source = self
            .archives
            .iter()
            .cloned()
            .fold(StubSource::new(), |source, (url, bytes)| {
                source.with_archive(url, bytes)
            });
        let fetcher = MapFetcher::new(source, ZipExtractor, VectorReader::new());
        Ok(match &config.scratch_dir {
            Some(dir) => Box::new(fetcher.with_scratch_root(dir.clone())),
            None => Box::new(fetcher),
        })
    }
}

pub(super) fn parse_summary(bytes: &[u8]) -> serde_json::Value {
    let text = std::str::from_utf8(bytes).expect("summary should be UTF-8");
    serde_json::from_str(text).expect("summary should be JSON")
}
