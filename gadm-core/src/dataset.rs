//! In-memory vector dataset produced by a [`GeoArchiveReader`](crate::GeoArchiveReader).

use std::collections::{BTreeMap, BTreeSet};

use geo::{BoundingRect, Coord, Geometry, Rect};

/// A single attribute value attached to a feature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PropertyValue {
    /// Missing value.
    Null,
    /// Whole number.
    Integer(i64),
    /// Floating-point number.
    Real(f64),
    /// Logical value.
    Boolean(bool),
    /// UTF-8 text.
    Text(String),
    /// Opaque bytes.
    Blob(Vec<u8>),
}

impl PropertyValue {
    /// Borrow the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// One geometry and its attributes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feature {
    /// Feature identifier, when the source carries one.
    pub id: Option<i64>,
    /// Geometry in the dataset's reference system; `None` for empty shapes.
    pub geometry: Option<Geometry<f64>>,
    /// Attribute values keyed by column name.
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Feature {
    /// Look up an attribute by column name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// Features of one layer, as read from an extracted archive.
///
/// # Examples
/// ```
/// use geo::{Geometry, point};
/// use gadm_core::{Feature, SpatialDataset};
///
/// let dataset = SpatialDataset {
///     layer: "gadm36_AFG_0".to_owned(),
///     srs: Some("EPSG:4326".to_owned()),
///     features: vec![Feature {
///         geometry: Some(Geometry::Point(point!(x: 65.0, y: 33.0))),
///         ..Feature::default()
///     }],
/// };
/// assert_eq!(dataset.len(), 1);
/// assert!(dataset.bounds().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpatialDataset {
    /// Name of the layer the features came from.
    pub layer: String,
    /// Spatial reference, e.g. `EPSG:4326` or a WKT string.
    pub srs: Option<String>,
    /// Features in source order.
    pub features: Vec<Feature>,
}

impl SpatialDataset {
    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the layer has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounding rectangle covering every feature geometry.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .filter_map(|geometry| geometry.bounding_rect())
            .reduce(merge_bounds)
    }

    /// Sorted, de-duplicated attribute names across all features.
    pub fn property_names(&self) -> Vec<&str> {
        self.features
            .iter()
            .flat_map(|feature| feature.properties.keys())
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn merge_bounds(left: Rect<f64>, right: Rect<f64>) -> Rect<f64> {
    let left_min = left.min();
    let left_max = left.max();
    let right_min = right.min();
    let right_max = right.max();
    Rect::new(
        Coord {
            x: left_min.x.min(right_min.x),
            y: left_min.y.min(right_min.y),
        },
        Coord {
            x: left_max.x.max(right_max.x),
            y: left_max.y.max(right_max.y),
        },
    )
}
