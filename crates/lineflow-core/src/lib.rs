//! Lineflow Core - Panel domain model and wire encoding
//!
//! This crate contains everything about a segmented light fixture that does
//! not need a network connection:
//! - Panel layout and angular position around the fixture centroid
//! - Grouping of panels into zones (automatic or manual)
//! - Commanded state store and brightness scaling
//! - Snapshot assembly and the two command encodings (custom animation text
//!   and stream datagram)
//!
//! ## Modules
//!
//! - [`panel`] - Panel and raw layout types
//! - [`layout`] - Layout resolver
//! - [`grouping`] - Grouping engine and manual group syntax
//! - [`color`] - RGB and brightness scaling
//! - [`state`] - Commanded state store
//! - [`snapshot`] - Full-fixture frame assembly
//! - [`command`] - Frame encoding
//! - [`error`] - Error types

#![allow(missing_docs)]

pub mod color;
pub mod command;
pub mod error;
pub mod grouping;
pub mod layout;
pub mod panel;
pub mod snapshot;
pub mod state;

// Re-exports
pub use color::Rgb;
pub use command::{DisplayCommand, EffectCommand, Frame, FrameEntry, Transition};
pub use error::{CoreError, Result};
pub use grouping::{
    build_groups, group_by_indices, group_by_position, Group, ManualGroups, DEFAULT_GROUP_SIZE,
};
pub use layout::{resolve_panels, sort_by_angle, LayoutReport};
pub use panel::{LayoutDocument, Panel, PanelId, PositionData, ShapeType};
pub use snapshot::assemble_snapshot;
pub use state::{CommandedState, SessionId, StateKey, StatePatch, StateStore, Target};
