//! Integration setup
//!
//! Connects a session, runs the first refresh and builds one light per
//! segment plus one per group.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::coordinator::{Coordinator, DEFAULT_POLL_INTERVAL};
use crate::entity::{SegmentGroup, SegmentLight};
use crate::error::Result;
use crate::models::DeviceConfig;
use crate::session::DeviceSession;
use lineflow_core::{ManualGroups, DEFAULT_GROUP_SIZE};

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationOptions {
    pub create_groups: bool,
    pub group_size: usize,
    pub manual_groups: Option<ManualGroups>,
    pub poll_interval: Duration,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            create_groups: true,
            group_size: DEFAULT_GROUP_SIZE,
            manual_groups: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

pub struct Integration {
    coordinator: Arc<Coordinator>,
    segments: Vec<SegmentLight>,
    groups: Vec<SegmentGroup>,
}

impl Integration {
    /// Fails if the layout or the first state read fails. Streaming
    /// negotiation failures only degrade the session.
    pub async fn setup(config: DeviceConfig, options: IntegrationOptions) -> Result<Self> {
        let session = Arc::new(DeviceSession::connect(config).await?);
        Self::with_session(session, options).await
    }

    pub async fn with_session(session: Arc<DeviceSession>, options: IntegrationOptions) -> Result<Self> {
        let coordinator = Arc::new(Coordinator::new(session, options.poll_interval));
        coordinator.refresh().await?;

        let session = coordinator.session();
        let segments = session
            .panels()
            .iter()
            .enumerate()
            .map(|(index, panel)| SegmentLight::new(Arc::clone(&coordinator), panel.clone(), index))
            .collect::<Vec<_>>();

        let groups = if options.create_groups {
            session
                .groups(options.manual_groups.as_ref(), options.group_size)
                .into_iter()
                .map(|group| SegmentGroup::new(Arc::clone(&coordinator), group))
                .collect()
        } else {
            Vec::new()
        };

        info!(
            "Set up {} with {} segment lights and {} group lights",
            session.id(),
            segments.len(),
            groups.len()
        );

        Ok(Self {
            coordinator,
            segments,
            groups,
        })
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn session(&self) -> &Arc<DeviceSession> {
        self.coordinator.session()
    }

    pub fn segments(&self) -> &[SegmentLight] {
        &self.segments
    }

    pub fn groups(&self) -> &[SegmentGroup] {
        &self.groups
    }
}

impl std::fmt::Debug for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integration")
            .field("session", self.session())
            .field("segments", &self.segments.len())
            .field("groups", &self.groups.len())
            .finish()
    }
}
