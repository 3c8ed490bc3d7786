//! Naming conventions of the GADM archive host.
//!
//! Every function here is pure string composition. The templates must stay
//! byte-for-byte identical to the host layout:
//!
//! - `https://biogeo.ucdavis.edu/data/{version}/gpkg/{version_nodots}_{country}_gpkg.zip`
//! - `https://biogeo.ucdavis.edu/data/{version}/shp/{version_nodots}_{country}_shp.zip`

use std::{fmt, ops::Deref};

use crate::MapFormat;

/// Root of the GADM download area.
pub const ARCHIVE_HOST: &str = "https://biogeo.ucdavis.edu/data";

/// Fully qualified URL of a country archive.
///
/// # Examples
/// ```
/// # use gadm_core::ArchiveUrl;
/// let url = ArchiveUrl::new("https://example.test/gadm36_AFG_gpkg.zip");
/// assert!(url.ends_with(".zip"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveUrl(String);

impl ArchiveUrl {
    /// Construct a new [`ArchiveUrl`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ArchiveUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ArchiveUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ArchiveUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip every `.` from `version`; nothing else is touched.
///
/// # Examples
/// ```
/// # use gadm_core::version_without_dots;
/// assert_eq!(version_without_dots("gadm3.6"), "gadm36");
/// assert_eq!(version_without_dots("v2.8"), "v28");
/// ```
pub fn version_without_dots(version: &str) -> String {
    version.replace('.', "")
}

fn archive_url(country: &str, version: &str, format: MapFormat) -> ArchiveUrl {
    let tag = format.as_str();
    ArchiveUrl::new(format!(
        "{ARCHIVE_HOST}/{version}/{tag}/{nodots}_{country}_{tag}.zip",
        nodots = version_without_dots(version),
    ))
}

/// URL of the GeoPackage archive for `country` at `version`.
///
/// # Examples
/// ```
/// # use gadm_core::geopackage_url;
/// assert_eq!(
///     geopackage_url("AFG", "gadm3.6").as_ref(),
///     "https://biogeo.ucdavis.edu/data/gadm3.6/gpkg/gadm36_AFG_gpkg.zip",
/// );
/// ```
pub fn geopackage_url(country: &str, version: &str) -> ArchiveUrl {
    archive_url(country, version, MapFormat::GeoPackage)
}

/// URL of the shapefile archive for `country` at `version`.
///
/// # Examples
/// ```
/// # use gadm_core::shapefile_url;
/// assert_eq!(
///     shapefile_url("AFG", "v2.8").as_ref(),
///     "https://biogeo.ucdavis.edu/data/v2.8/shp/v28_AFG_shp.zip",
/// );
/// ```
pub fn shapefile_url(country: &str, version: &str) -> ArchiveUrl {
    archive_url(country, version, MapFormat::Shapefile)
}

/// File name of the GeoPackage inside the extracted archive.
pub fn geopackage_filename(version: &str, country: &str) -> String {
    format!("{}_{country}.gpkg", version_without_dots(version))
}

/// Shapefile layer name for one administrative level: `{nodots}_{country}_{layer}`.
///
/// # Examples
/// ```
/// # use gadm_core::layer_filename;
/// assert_eq!(layer_filename("gadm3.6", "AFG", 2), "gadm36_AFG_2");
/// ```
pub fn layer_filename(version: &str, country: &str, layer: usize) -> String {
    format!("{}_{country}_{layer}", version_without_dots(version))
}
