//! Row-aligned spreadsheet data and marker synthesis
//!
//! A spreadsheet source fetches, per dimension, three independent columns
//! that are only related by row position: names, coordinates, and an
//! optional visibility/color override column. [`synthesize`] reconciles
//! them into the canonical marker list.
//!
//! Reconciliation rules:
//! - rows align positionally; anything beyond the shortest column is
//!   ignored
//! - a row whose coordinate is missing or unparseable produces no marker
//! - integral horizontal coordinates are shifted to the center of their
//!   grid cell (+0.5 on x and z)
//! - without an override column every row is visible; with one, an absent
//!   cell means hidden and a present cell is read as a boolean flag or,
//!   failing that, as non-empty-text truthiness

use serde::{Deserialize, Serialize};

use crate::markers::PlayerMarker;

/// A normalized red/green/blue triple as reported by the data source,
/// each channel in 0.0..=1.0 with absent channels reading as zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelColor {
    /// Red channel
    #[serde(default)]
    pub red: f64,

    /// Green channel
    #[serde(default)]
    pub green: f64,

    /// Blue channel
    #[serde(default)]
    pub blue: f64,
}

impl ChannelColor {
    /// Two hex digits per channel, truncating: `{red: 1, green: 0.5}`
    /// becomes `#ff7f00`
    pub fn to_hex(self) -> String {
        let channel = |v: f64| (v * 255.0) as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.red),
            channel(self.green),
            channel(self.blue)
        )
    }
}

/// One row of the coordinate column, as fetched
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordRow {
    /// Horizontal axis, mandatory
    pub x: Option<f64>,

    /// Vertical axis, defaults to 0 when absent
    pub y: Option<f64>,

    /// Horizontal axis, mandatory
    pub z: Option<f64>,
}

impl CoordRow {
    /// Resolve into a position, or `None` when either horizontal axis is
    /// missing. Applies block-centering to x and z.
    pub fn resolve(&self) -> Option<[f64; 3]> {
        let x = self.x?;
        let z = self.z?;
        Some([centre_block(x), self.y.unwrap_or(0.0), centre_block(z)])
    }
}

/// Shift an integral grid coordinate to the center of its cell; values
/// that already carry sub-cell precision pass through unchanged
pub fn centre_block(value: f64) -> f64 {
    if value.fract() == 0.0 {
        value + 0.5
    } else {
        value
    }
}

/// One row of the visibility/color override column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckCell {
    /// Explicit boolean flag, when the cell holds one
    pub flag: Option<bool>,

    /// The cell's display text, for the truthiness fallback
    pub text: Option<String>,

    /// Formatting color attached to the cell
    pub color: Option<ChannelColor>,
}

impl CheckCell {
    /// Visibility: the boolean flag if available, else non-empty trimmed
    /// text
    pub fn visible(&self) -> bool {
        self.flag
            .unwrap_or_else(|| self.text.as_deref().is_some_and(|t| !t.trim().is_empty()))
    }
}

/// The three row-aligned columns fetched for one dimension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionRows {
    /// Dimension identifier stamped onto every marker
    pub dimension_id: i64,

    /// Name column
    pub names: Vec<String>,

    /// Coordinate column; `None` marks a row with no coordinate cells
    pub coords: Vec<Option<CoordRow>>,

    /// Override column; `None` means the column was not fetched at all,
    /// an inner `None` marks an empty row within a fetched column
    pub checks: Option<Vec<Option<CheckCell>>>,
}

/// Reconcile fetched dimensions into the canonical marker list.
///
/// Output order is dimension order, then row order; markers with the same
/// name in different dimensions are all kept.
pub fn synthesize(dimensions: &[DimensionRows]) -> Vec<PlayerMarker> {
    let mut markers = Vec::new();

    for dimension in dimensions {
        let mut limit = dimension.names.len().min(dimension.coords.len());
        if let Some(checks) = &dimension.checks {
            limit = limit.min(checks.len());
        }

        for row in 0..limit {
            let Some(position) = dimension.coords[row].as_ref().and_then(CoordRow::resolve)
            else {
                continue;
            };

            let (visible, explicit_color) = match &dimension.checks {
                None => (true, None),
                Some(checks) => match &checks[row] {
                    None => (false, None),
                    Some(cell) => (cell.visible(), cell.color.map(ChannelColor::to_hex)),
                },
            };

            let mut marker =
                PlayerMarker::new(dimension.names[row].clone(), position, dimension.dimension_id);
            marker.visible = visible;
            // infallible: every synthesized marker carries a name
            let _ = marker.derive_identity();
            let _ = marker.assign_color(explicit_color);
            markers.push(marker);
        }
    }

    markers
}
