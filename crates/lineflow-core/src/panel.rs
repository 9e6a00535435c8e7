//! Panel model and the raw layout document served by the device.

use serde::{Deserialize, Serialize};

/// Device-assigned panel identifier.
pub type PanelId = u16;

/// Shape classification reported for every component in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum ShapeType {
    /// Passive joint between two segments (16)
    Connector,
    /// Illuminating line segment (18)
    LineSegment,
    /// Power supply / controller (19)
    Controller,
    /// Alternate controller revision (20)
    ControllerAlt,
    /// Anything this integration does not know about
    Other(u16),
}

impl ShapeType {
    pub const CONNECTOR: u16 = 16;
    pub const LINE_SEGMENT: u16 = 18;
    pub const CONTROLLER: u16 = 19;
    pub const CONTROLLER_ALT: u16 = 20;

    /// Human readable label used in layout reports.
    pub fn label(&self) -> &'static str {
        match self {
            ShapeType::Connector => "connector",
            ShapeType::LineSegment => "line segment",
            ShapeType::Controller | ShapeType::ControllerAlt => "controller",
            ShapeType::Other(_) => "unknown",
        }
    }

    /// Only line segments emit light and accept colour commands.
    pub fn is_controllable(&self) -> bool {
        matches!(self, ShapeType::LineSegment)
    }
}

impl From<u16> for ShapeType {
    fn from(value: u16) -> Self {
        match value {
            Self::CONNECTOR => ShapeType::Connector,
            Self::LINE_SEGMENT => ShapeType::LineSegment,
            Self::CONTROLLER => ShapeType::Controller,
            Self::CONTROLLER_ALT => ShapeType::ControllerAlt,
            other => ShapeType::Other(other),
        }
    }
}

impl From<ShapeType> for u16 {
    fn from(value: ShapeType) -> Self {
        match value {
            ShapeType::Connector => ShapeType::CONNECTOR,
            ShapeType::LineSegment => ShapeType::LINE_SEGMENT,
            ShapeType::Controller => ShapeType::CONTROLLER,
            ShapeType::ControllerAlt => ShapeType::CONTROLLER_ALT,
            ShapeType::Other(raw) => raw,
        }
    }
}

/// One component entry of `positionData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionData {
    pub panel_id: PanelId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "o", default)]
    pub orientation: f64,
    pub shape_type: ShapeType,
}

/// Body of `GET /panelLayout/layout`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    #[serde(default)]
    pub num_panels: usize,
    #[serde(default)]
    pub side_length: f64,
    pub position_data: Vec<PositionData>,
}

/// A controllable panel with its angle around the fixture centroid.
///
/// Geometry is fixed for the lifetime of a session; panels are built once
/// from a layout snapshot and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub id: PanelId,
    pub x: f64,
    pub y: f64,
    pub orientation: f64,
    pub shape_type: ShapeType,
    /// Degrees in `[0, 360)`, rounded to two decimals.
    pub angle: f64,
}
