//! Light entities
//!
//! A [`SegmentLight`] drives one line segment, a [`SegmentGroup`] drives a
//! zone of segments. Both write the commanded state first and then hand a
//! frame to the dispatcher.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::coordinator::Coordinator;
use crate::transport::Delivery;
use lineflow_core::{
    assemble_snapshot, CommandedState, Frame, Group, Panel, PanelId, Rgb, StateKey, StatePatch,
    Transition,
};

/// Arguments of a turn-on request. Absent fields keep their commanded value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurnOn {
    pub brightness: Option<u8>,
    pub rgb_color: Option<Rgb>,
    /// Seconds. Segment lights fade over it; groups ignore it and use the
    /// fixed streaming transition.
    pub transition: Option<f64>,
}

impl TurnOn {
    pub fn color(rgb: Rgb) -> Self {
        Self {
            rgb_color: Some(rgb),
            ..Self::default()
        }
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_transition(mut self, secs: f64) -> Self {
        self.transition = Some(secs);
        self
    }

    fn patch(&self) -> StatePatch {
        StatePatch::on()
            .with_brightness(self.brightness)
            .with_color(self.rgb_color)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentAttributes {
    pub panel_id: PanelId,
    pub x: f64,
    pub y: f64,
    pub orientation: f64,
    pub shape_type: String,
    pub segment_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAttributes {
    pub panel_ids: Vec<PanelId>,
    pub group_index: usize,
    pub segment_count: usize,
}

/// One line segment of the fixture.
#[derive(Clone)]
pub struct SegmentLight {
    coordinator: Arc<Coordinator>,
    panel: Panel,
    index: usize,
}

impl SegmentLight {
    pub fn new(coordinator: Arc<Coordinator>, panel: Panel, index: usize) -> Self {
        Self {
            coordinator,
            panel,
            index,
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> String {
        format!("Segment {}", self.index + 1)
    }

    pub fn unique_id(&self) -> String {
        format!("{}_segment_{}", self.coordinator.session().id(), self.panel.id)
    }

    fn key(&self) -> StateKey {
        StateKey::panel(self.coordinator.session().id(), self.panel.id)
    }

    pub fn commanded_state(&self) -> CommandedState {
        self.coordinator.session().store().get(&self.key())
    }

    /// Commanded on and the fixture itself on.
    pub fn is_on(&self) -> bool {
        self.commanded_state().is_on && self.coordinator.global_on()
    }

    pub fn brightness(&self) -> u8 {
        self.commanded_state().brightness
    }

    pub fn rgb_color(&self) -> Rgb {
        self.commanded_state().rgb_color
    }

    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    pub fn attributes(&self) -> SegmentAttributes {
        SegmentAttributes {
            panel_id: self.panel.id,
            x: self.panel.x,
            y: self.panel.y,
            orientation: self.panel.orientation,
            shape_type: self.panel.shape_type.label().to_string(),
            segment_index: self.index,
        }
    }

    pub async fn turn_on(&self, request: TurnOn) -> Delivery {
        let state = self.coordinator.session().store().set(self.key(), &request.patch());
        debug!("{} on: {:?}", self.name(), state);
        self.send_snapshot(request.transition).await
    }

    pub async fn turn_off(&self, transition: Option<f64>) -> Delivery {
        self.coordinator.session().store().set(self.key(), &StatePatch::off());
        debug!("{} off", self.name());
        self.send_snapshot(transition).await
    }

    /// Sends every segment so the untouched ones keep their colours.
    async fn send_snapshot(&self, transition: Option<f64>) -> Delivery {
        let session = self.coordinator.session();
        let transition = transition
            .map(Transition::from_secs_f64)
            .unwrap_or(Transition::NONE);
        let frame = assemble_snapshot(session.store(), session.id(), &session.panel_ids(), transition);
        session.send_reliable(&frame).await
    }
}

impl std::fmt::Debug for SegmentLight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentLight")
            .field("index", &self.index)
            .field("panel", &self.panel)
            .finish()
    }
}

/// A zone of segments driven as one light.
#[derive(Clone)]
pub struct SegmentGroup {
    coordinator: Arc<Coordinator>,
    group: Group,
}

impl SegmentGroup {
    pub fn new(coordinator: Arc<Coordinator>, group: Group) -> Self {
        Self { coordinator, group }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn name(&self) -> String {
        format!("Group {}", self.group.index + 1)
    }

    pub fn unique_id(&self) -> String {
        format!("{}_group_{}", self.coordinator.session().id(), self.group.index)
    }

    fn key(&self) -> StateKey {
        StateKey::group(self.coordinator.session().id(), self.group.index)
    }

    pub fn commanded_state(&self) -> CommandedState {
        self.coordinator.session().store().get(&self.key())
    }

    pub fn is_on(&self) -> bool {
        self.commanded_state().is_on && self.coordinator.global_on()
    }

    pub fn brightness(&self) -> u8 {
        self.commanded_state().brightness
    }

    pub fn rgb_color(&self) -> Rgb {
        self.commanded_state().rgb_color
    }

    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    pub fn attributes(&self) -> GroupAttributes {
        GroupAttributes {
            panel_ids: self.group.panel_ids.clone(),
            group_index: self.group.index,
            segment_count: self.group.len(),
        }
    }

    pub async fn turn_on(&self, request: TurnOn) -> Delivery {
        self.apply(&request.patch()).await
    }

    /// The transition is accepted for symmetry with segment lights and
    /// ignored, as it is on turn-on.
    pub async fn turn_off(&self, _transition: Option<f64>) -> Delivery {
        self.apply(&StatePatch::off()).await
    }

    async fn apply(&self, patch: &StatePatch) -> Delivery {
        let session = self.coordinator.session();
        let state = session.store().set(self.key(), patch);
        debug!("{} -> {:?}", self.name(), state);

        // Members take the group's full state so per-segment snapshots keep it.
        let member = StatePatch {
            is_on: Some(state.is_on),
            brightness: Some(state.brightness),
            rgb_color: Some(state.rgb_color),
        };
        for &id in &self.group.panel_ids {
            session.store().set(StateKey::panel(session.id(), id), &member);
        }

        let frame = Frame::uniform(&self.group.panel_ids, state.visible_color(), Transition::SMOOTH);
        session.send_streaming(&frame, true).await
    }
}

impl std::fmt::Debug for SegmentGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentGroup")
            .field("group", &self.group)
            .finish()
    }
}
