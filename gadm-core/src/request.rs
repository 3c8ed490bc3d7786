//! Request-side domain wrappers: country, dataset version and format set.

use std::{fmt, ops::Deref, str::FromStr};

use thiserror::Error;

/// Dataset version used when a caller does not name one.
pub const DEFAULT_VERSION: &str = "gadm3.6";

/// ISO-3166-1 alpha-3 country code, e.g. `AFG`.
///
/// The code is trimmed but otherwise carried verbatim; the archive host
/// decides whether it exists.
///
/// # Examples
/// ```
/// # use gadm_core::CountryCode;
/// let code = CountryCode::new(" AFG ");
/// assert_eq!(code.as_ref(), "AFG");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CountryCode(String);

impl CountryCode {
    /// Construct a new [`CountryCode`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for CountryCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for CountryCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for CountryCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dataset version tag as published by GADM, e.g. `gadm3.6`.
///
/// # Examples
/// ```
/// # use gadm_core::DatasetVersion;
/// let version = DatasetVersion::default();
/// assert_eq!(version.as_ref(), "gadm3.6");
/// assert_eq!(version.without_dots(), "gadm36");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetVersion(String);

impl DatasetVersion {
    /// Construct a new [`DatasetVersion`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The version with every `.` removed, as used in archive file names.
    pub fn without_dots(&self) -> String {
        crate::naming::version_without_dots(&self.0)
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for DatasetVersion {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}

impl From<&str> for DatasetVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for DatasetVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for DatasetVersion {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source file format of a GADM distribution.
///
/// # Examples
/// ```
/// use gadm_core::MapFormat;
///
/// assert_eq!(MapFormat::GeoPackage.as_str(), "gpkg");
/// assert_eq!("shp".parse::<MapFormat>(), Ok(MapFormat::Shapefile));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapFormat {
    /// Single-file GeoPackage holding every administrative level.
    #[cfg_attr(feature = "serde", serde(rename = "gpkg"))]
    GeoPackage,
    /// One shapefile set per administrative level.
    #[cfg_attr(feature = "serde", serde(rename = "shp"))]
    Shapefile,
}

impl MapFormat {
    /// Return the short format tag used in archive paths.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GeoPackage => "gpkg",
            Self::Shapefile => "shp",
        }
    }
}

impl fmt::Display for MapFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a format tag is neither `gpkg` nor `shp`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown map format '{0}' (expected 'gpkg' or 'shp')")]
pub struct ParseMapFormatError(pub String);

impl FromStr for MapFormat {
    type Err = ParseMapFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpkg" | "geopackage" => Ok(Self::GeoPackage),
            "shp" | "shapefile" => Ok(Self::Shapefile),
            _ => Err(ParseMapFormatError(s.to_owned())),
        }
    }
}

/// Set of requested formats. Membership is all that matters; duplicates and
/// order are ignored.
///
/// # Examples
/// ```
/// use gadm_core::{MapFormat, MapFormats};
///
/// let both: MapFormats = [MapFormat::Shapefile, MapFormat::GeoPackage].into_iter().collect();
/// assert!(both.contains(MapFormat::GeoPackage));
/// assert!(both.contains(MapFormat::Shapefile));
/// assert!(MapFormats::default().is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapFormats {
    geopackage: bool,
    shapefile: bool,
}

impl MapFormats {
    /// Set containing only `format`.
    pub const fn only(format: MapFormat) -> Self {
        match format {
            MapFormat::GeoPackage => Self {
                geopackage: true,
                shapefile: false,
            },
            MapFormat::Shapefile => Self {
                geopackage: false,
                shapefile: true,
            },
        }
    }

    /// Add `format` to the set.
    #[must_use]
    pub const fn with(mut self, format: MapFormat) -> Self {
        match format {
            MapFormat::GeoPackage => self.geopackage = true,
            MapFormat::Shapefile => self.shapefile = true,
        }
        self
    }

    /// Whether `format` was requested.
    pub const fn contains(self, format: MapFormat) -> bool {
        match format {
            MapFormat::GeoPackage => self.geopackage,
            MapFormat::Shapefile => self.shapefile,
        }
    }

    /// Whether no format was requested.
    pub const fn is_empty(self) -> bool {
        !self.geopackage && !self.shapefile
    }
}

impl From<MapFormat> for MapFormats {
    fn from(value: MapFormat) -> Self {
        Self::only(value)
    }
}

impl FromIterator<MapFormat> for MapFormats {
    fn from_iter<T: IntoIterator<Item = MapFormat>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), Self::with)
    }
}

/// A single map request. Transient; built per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRequest {
    /// Country to fetch.
    pub country: CountryCode,
    /// Dataset version tag.
    pub version: DatasetVersion,
    /// Requested source formats.
    pub formats: MapFormats,
    /// Zero-based administrative level.
    pub layer: usize,
}

impl MapRequest {
    /// Request the national boundary (layer 0) of `country` as a GeoPackage
    /// from the default dataset version.
    pub fn new(country: impl Into<CountryCode>) -> Self {
        Self {
            country: country.into(),
            version: DatasetVersion::default(),
            formats: MapFormats::only(MapFormat::GeoPackage),
            layer: 0,
        }
    }

    /// Override the dataset version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<DatasetVersion>) -> Self {
        self.version = version.into();
        self
    }

    /// Replace the requested formats.
    #[must_use]
    pub fn with_formats(mut self, formats: impl Into<MapFormats>) -> Self {
        self.formats = formats.into();
        self
    }

    /// Select the administrative level.
    #[must_use]
    pub const fn with_layer(mut self, layer: usize) -> Self {
        self.layer = layer;
        self
    }
}
