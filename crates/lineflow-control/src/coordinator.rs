//! Polling coordinator
//!
//! Periodically reads the device's global state and publishes it together
//! with the (fixed) segment list. Entities use the last result for their
//! availability and for the global on/off flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{DeviceError, Result};
use crate::models::DeviceInfo;
use crate::session::DeviceSession;
use crate::transport::Delivery;
use lineflow_core::{Frame, Panel, Rgb, StateKey, StatePatch, Transition};

/// Default polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Result of one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub state: DeviceInfo,
    /// Controllable panels in layout order. Fetched once per session.
    pub segments: Vec<Panel>,
}

pub struct Coordinator {
    session: Arc<DeviceSession>,
    interval: Duration,
    last_update_success: AtomicBool,
    updates: watch::Sender<Option<DeviceSnapshot>>,
}

impl Coordinator {
    pub fn new(session: Arc<DeviceSession>, interval: Duration) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            session,
            interval,
            last_update_success: AtomicBool::new(false),
            updates,
        }
    }

    pub fn session(&self) -> &Arc<DeviceSession> {
        &self.session
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn segments(&self) -> &[Panel] {
        self.session.panels()
    }

    /// Reads the device state and publishes a new snapshot.
    ///
    /// A rejected token is returned as [`DeviceError::Auth`] so it is not
    /// retried; every other failure becomes `DeviceUnreachable`.
    pub async fn refresh(&self) -> Result<DeviceSnapshot> {
        match self.session.get_state().await {
            Ok(state) => {
                let snapshot = DeviceSnapshot {
                    state,
                    segments: self.session.panels().to_vec(),
                };
                self.last_update_success.store(true, Ordering::Relaxed);
                self.updates.send_replace(Some(snapshot.clone()));
                Ok(snapshot)
            }
            Err(DeviceError::Auth) => {
                self.last_update_success.store(false, Ordering::Relaxed);
                Err(DeviceError::Auth)
            }
            Err(e) => {
                self.last_update_success.store(false, Ordering::Relaxed);
                Err(DeviceError::DeviceUnreachable(format!(
                    "Error communicating with API: {}",
                    e
                )))
            }
        }
    }

    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::Relaxed)
    }

    /// Last published snapshot, if any refresh has succeeded.
    pub fn data(&self) -> Option<DeviceSnapshot> {
        self.updates.borrow().clone()
    }

    /// Global on flag from the last snapshot; on when nothing is known.
    pub fn global_on(&self) -> bool {
        self.updates
            .borrow()
            .as_ref()
            .map(|s| s.state.is_on())
            .unwrap_or(true)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DeviceSnapshot>> {
        self.updates.subscribe()
    }

    /// Runs [`refresh`](Self::refresh) every interval until the task is aborted.
    pub fn spawn_polling(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(coordinator.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; setup already refreshed.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match coordinator.refresh().await {
                    Ok(_) => debug!("Refreshed {}", coordinator.session.id()),
                    Err(e) => warn!("Refresh of {} failed: {}", coordinator.session.id(), e),
                }
            }
        })
    }

    /// Sets several segments at once, addressed by layout index.
    ///
    /// Indices past the segment list are ignored. Each targeted panel is
    /// recorded as on at full brightness with its new colour.
    pub async fn set_multiple_segments(
        &self,
        segment_colors: impl IntoIterator<Item = (usize, Rgb)>,
        transition_secs: f64,
    ) -> Delivery {
        let transition = Transition::from_secs_f64(transition_secs);
        let segments = self.session.panels();
        let store = self.session.store();

        let mut frame = Frame::new();
        for (index, color) in segment_colors {
            let Some(panel) = segments.get(index) else {
                debug!("Ignoring segment index {} (have {})", index, segments.len());
                continue;
            };
            store.set(
                StateKey::panel(self.session.id(), panel.id),
                &StatePatch::on()
                    .with_brightness(Some(255))
                    .with_color(Some(color)),
            );
            frame.set(panel.id, color, transition);
        }

        self.session.send_reliable(&frame).await
    }
}
