//! Device session
//!
//! One session per fixture. It owns the control-plane client, the streaming
//! channel, the commanded state store and the immutable panel set fetched
//! at setup.

use crate::api::DeviceClient;
use crate::error::Result;
use crate::models::{DeviceConfig, DeviceInfo, StateUpdate};
use crate::stream::StreamStatus;
use crate::transport::{Delivery, Dispatcher};
use lineflow_core::{
    build_groups, resolve_panels, Frame, Group, LayoutReport, ManualGroups, Panel, PanelId,
    SessionId, StateStore,
};
use tracing::info;

pub struct DeviceSession {
    id: SessionId,
    dispatcher: Dispatcher,
    store: StateStore,
    panels: Vec<Panel>, // Layout order
}

impl DeviceSession {
    /// Sets up a session: fetches the layout, then tries to enable streaming.
    ///
    /// Layout failures are returned; a streaming failure only degrades the
    /// session to the reliable path.
    pub async fn connect(config: DeviceConfig) -> Result<Self> {
        let session = Self::connect_reliable_only(config).await?;
        session.dispatcher.enable_streaming_channel().await;
        Ok(session)
    }

    /// Sets up a session without touching the streaming channel.
    pub async fn connect_reliable_only(config: DeviceConfig) -> Result<Self> {
        let client = DeviceClient::new(config)?;
        let layout = client.get_layout().await?;
        let panels = resolve_panels(&layout);

        info!(
            "Connected to {} with {} line segments ({} components)",
            client.config().host,
            panels.len(),
            layout.position_data.len()
        );

        Ok(Self {
            id: SessionId::new(client.config().host.clone()),
            dispatcher: Dispatcher::new(client),
            store: StateStore::new(),
            panels,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &DeviceConfig {
        self.dispatcher.client().config()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Controllable panels in layout order.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.panels.iter().map(|p| p.id).collect()
    }

    pub fn groups(&self, manual: Option<&ManualGroups>, group_size: usize) -> Vec<Group> {
        build_groups(&self.panels, manual, group_size)
    }

    pub fn stream_status(&self) -> StreamStatus {
        self.dispatcher.stream_status()
    }

    /// Reads the layout again and resolves its panels.
    pub async fn fetch_layout(&self) -> Result<Vec<Panel>> {
        let layout = self.dispatcher.client().get_layout().await?;
        Ok(resolve_panels(&layout))
    }

    pub async fn layout_report(&self) -> Result<LayoutReport> {
        let layout = self.dispatcher.client().get_layout().await?;
        Ok(LayoutReport::from_layout(&layout))
    }

    pub async fn get_state(&self) -> Result<DeviceInfo> {
        self.dispatcher.client().get_info().await
    }

    /// Whole-fixture on/off and brightness, independent of panel colours.
    pub async fn set_state(&self, on: Option<bool>, brightness: Option<u16>) -> Result<()> {
        self.dispatcher
            .client()
            .set_state(&StateUpdate::new(on, brightness))
            .await
    }

    pub async fn enable_streaming_channel(&self) -> StreamStatus {
        self.dispatcher.enable_streaming_channel().await
    }

    pub async fn send_reliable(&self, frame: &Frame) -> Delivery {
        self.dispatcher.send_reliable(frame).await
    }

    pub async fn send_streaming(&self, frame: &Frame, smooth: bool) -> Delivery {
        self.dispatcher.send_streaming(frame, smooth).await
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("id", &self.id)
            .field("config", self.config())
            .field("panels", &self.panels.len())
            .field("stream", &self.stream_status())
            .finish()
    }
}
