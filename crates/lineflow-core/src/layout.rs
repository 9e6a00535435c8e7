//! Layout resolution
//!
//! Turns the raw component list served by the device into the set of
//! controllable panels, each tagged with its angle around the centroid of
//! all controllable panels. The angle is the sort key used by automatic
//! grouping.

use std::collections::BTreeMap;

use crate::panel::{LayoutDocument, Panel, PositionData, ShapeType};

/// Filters a layout down to line segments and attaches their angles.
///
/// Panels are returned in layout (input) order. Callers that need angular
/// order must use [`sort_by_angle`].
pub fn resolve_panels(layout: &LayoutDocument) -> Vec<Panel> {
    let segments: Vec<&PositionData> = layout
        .position_data
        .iter()
        .filter(|p| p.shape_type.is_controllable())
        .collect();

    let Some((cx, cy)) = centroid(segments.iter().map(|p| (p.x, p.y))) else {
        return Vec::new();
    };

    segments
        .into_iter()
        .map(|p| Panel {
            id: p.panel_id,
            x: p.x,
            y: p.y,
            orientation: p.orientation,
            shape_type: p.shape_type,
            angle: angle_around(cx, cy, p.x, p.y),
        })
        .collect()
}

/// Arithmetic mean of the points, `None` for an empty set.
pub fn centroid(points: impl IntoIterator<Item = (f64, f64)>) -> Option<(f64, f64)> {
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
    for (x, y) in points {
        sx += x;
        sy += y;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some((sx / n as f64, sy / n as f64))
}

/// Angle of `(x, y)` around `(cx, cy)` in degrees, rounded to two decimals.
///
/// Always in `[0, 360)`: a value that rounds up to 360 wraps to 0.
pub fn angle_around(cx: f64, cy: f64, x: f64, y: f64) -> f64 {
    let raw = ((y - cy).atan2(x - cx).to_degrees() + 360.0) % 360.0;
    let rounded = (raw * 100.0).round() / 100.0;
    if rounded >= 360.0 {
        0.0
    } else {
        rounded
    }
}

/// Stable ascending-angle order; equal angles keep their input order.
pub fn sort_by_angle(panels: &[Panel]) -> Vec<Panel> {
    let mut sorted = panels.to_vec();
    sorted.sort_by(|a, b| a.angle.total_cmp(&b.angle));
    sorted
}

/// Diagnostic summary of a raw layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutReport {
    /// Component count per shape type, all components included.
    pub shape_counts: BTreeMap<ShapeType, usize>,
    /// Centroid of the controllable panels.
    pub centroid: Option<(f64, f64)>,
    /// Controllable panels in ascending-angle order.
    pub panels: Vec<Panel>,
}

impl LayoutReport {
    pub fn from_layout(layout: &LayoutDocument) -> Self {
        let mut shape_counts = BTreeMap::new();
        for component in &layout.position_data {
            *shape_counts.entry(component.shape_type).or_insert(0) += 1;
        }

        let centroid = centroid(
            layout
                .position_data
                .iter()
                .filter(|p| p.shape_type.is_controllable())
                .map(|p| (p.x, p.y)),
        );

        Self {
            shape_counts,
            centroid,
            panels: sort_by_angle(&resolve_panels(layout)),
        }
    }

    pub fn count(&self, shape: ShapeType) -> usize {
        self.shape_counts.get(&shape).copied().unwrap_or(0)
    }

    pub fn total_components(&self) -> usize {
        self.shape_counts.values().sum()
    }
}
