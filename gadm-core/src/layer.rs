//! Translation of an administrative level into a discovered layer name.

use thiserror::Error;

/// How a reader's native layer listing maps onto administrative levels.
///
/// GADM GeoPackages list their layers finest-first, so level 0 (the national
/// boundary) is the last entry. [`LayerOrder::CoarsestLast`] captures that
/// convention and must not change for archives already in circulation.
///
/// # Examples
/// ```
/// use gadm_core::LayerOrder;
///
/// let layers = ["ADM_2", "ADM_1", "ADM_0"].map(String::from);
/// assert_eq!(LayerOrder::CoarsestLast.resolve(&layers, 0), Ok("ADM_0"));
/// assert_eq!(LayerOrder::CoarsestFirst.resolve(&layers, 0), Ok("ADM_2"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerOrder {
    /// Level `n` is native position `len - 1 - n`.
    CoarsestLast,
    /// Level `n` is native position `n`.
    CoarsestFirst,
}

/// A requested level lies outside `[0, available)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "layer {requested} is out of range: the dataset has {available} layers \
     (valid range [0, {available}))"
)]
pub struct LayerOutOfRange {
    /// Level asked for by the caller.
    pub requested: usize,
    /// Number of layers discovered in the dataset.
    pub available: usize,
}

impl LayerOrder {
    /// Native position of administrative level `requested` among
    /// `available` layers.
    pub const fn position(
        self,
        requested: usize,
        available: usize,
    ) -> Result<usize, LayerOutOfRange> {
        if requested >= available {
            return Err(LayerOutOfRange {
                requested,
                available,
            });
        }
        match self {
            Self::CoarsestLast => Ok(available - 1 - requested),
            Self::CoarsestFirst => Ok(requested),
        }
    }

    /// Pick the layer name for administrative level `requested`.
    pub fn resolve(self, layers: &[String], requested: usize) -> Result<&str, LayerOutOfRange> {
        let position = self.position(requested, layers.len())?;
        layers
            .get(position)
            .map(String::as_str)
            .ok_or(LayerOutOfRange {
                requested,
                available: layers.len(),
            })
    }
}
