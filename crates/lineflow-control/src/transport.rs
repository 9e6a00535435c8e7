//! Transport dispatcher
//!
//! Two delivery paths reach the device:
//!
//! - **Reliable**: a custom animation written over HTTP. Used for one-shot
//!   commands and as the fallback for streaming.
//! - **Streaming**: one UDP datagram per frame, after the device has been
//!   switched into external control.
//!
//! Colour commands are at-most-once and never fail the caller: every send
//! returns a [`Delivery`] describing what happened. A lost frame is
//! harmless; the next one supersedes it.

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::api::{DeviceClient, NEGOTIATE_TIMEOUT, WRITE_TIMEOUT};
use crate::error::DeviceError;
use crate::stream::{resolve, StreamChannel, StreamStatus};
use lineflow_core::{EffectCommand, Frame, Transition};

/// Outcome of a colour command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The device answered the control-plane write with success.
    Acknowledged,
    /// The write went out but no answer arrived in time. Most likely applied.
    Unconfirmed,
    /// The datagram was handed to the socket.
    Streamed,
    /// Nothing was delivered.
    Dropped(String),
}

impl Delivery {
    /// True unless the command is known not to have left this process.
    pub fn is_sent(&self) -> bool {
        !matches!(self, Delivery::Dropped(_))
    }
}

enum StreamLink {
    Unattempted,
    Enabled(StreamChannel),
    Disabled,
}

/// Chooses and drives the delivery path for each frame.
pub struct Dispatcher {
    client: DeviceClient,
    stream: RwLock<StreamLink>,
    negotiated: OnceCell<StreamStatus>,
}

impl Dispatcher {
    pub fn new(client: DeviceClient) -> Self {
        Self {
            client,
            stream: RwLock::new(StreamLink::Unattempted),
            negotiated: OnceCell::new(),
        }
    }

    /// Dispatcher whose streaming channel is already open, skipping
    /// negotiation (for devices switched to external control elsewhere).
    pub fn with_stream_channel(client: DeviceClient, channel: StreamChannel) -> Self {
        Self {
            client,
            stream: RwLock::new(StreamLink::Enabled(channel)),
            negotiated: OnceCell::new_with(Some(StreamStatus::Enabled)),
        }
    }

    pub fn client(&self) -> &DeviceClient {
        &self.client
    }

    pub fn stream_status(&self) -> StreamStatus {
        match &*self.stream.read() {
            StreamLink::Unattempted => StreamStatus::Unattempted,
            StreamLink::Enabled(_) => StreamStatus::Enabled,
            StreamLink::Disabled => StreamStatus::Disabled,
        }
    }

    /// Switches the device into external control and opens the datagram socket.
    ///
    /// Runs at most once: concurrent callers wait for the first attempt and
    /// later calls return its status. Any failure disables streaming for
    /// the rest of the session.
    pub async fn enable_streaming_channel(&self) -> StreamStatus {
        *self
            .negotiated
            .get_or_init(|| async {
                let link = match self.negotiate().await {
                    Ok(channel) => {
                        info!("External control enabled, streaming to {}", channel.target());
                        StreamLink::Enabled(channel)
                    }
                    Err(e) => {
                        warn!("Failed to enable external control, using HTTP only: {}", e);
                        StreamLink::Disabled
                    }
                };
                *self.stream.write() = link;
                self.stream_status()
            })
            .await
    }

    async fn negotiate(&self) -> Result<StreamChannel, DeviceError> {
        self.client
            .write_effect(&EffectCommand::external_control(), NEGOTIATE_TIMEOUT)
            .await?;

        let config = self.client.config();
        let port = match self.client.get_info_with_timeout(NEGOTIATE_TIMEOUT).await {
            Ok(info) => info.stream_control_port.unwrap_or(config.stream_port),
            Err(DeviceError::Json(_)) | Err(DeviceError::Http(_)) => {
                debug!("Device info not parsed, using default stream port {}", config.stream_port);
                config.stream_port
            }
            Err(e) => return Err(e),
        };

        StreamChannel::open(resolve(&config.host, port).await?)
    }

    /// Writes `frame` as a custom animation; at most one attempt, never an error.
    pub async fn send_reliable(&self, frame: &Frame) -> Delivery {
        if frame.is_empty() {
            // An empty animation would switch every panel off.
            return Delivery::Dropped("empty frame".to_string());
        }

        let command = EffectCommand::custom(frame);
        match self.client.write_effect(&command, WRITE_TIMEOUT).await {
            Ok(_) => {
                debug!("Custom animation with {} panels acknowledged", frame.len());
                Delivery::Acknowledged
            }
            Err(DeviceError::Timeout(_)) => {
                debug!("Custom animation sent, no acknowledgement in time");
                Delivery::Unconfirmed
            }
            Err(e) => {
                warn!("Dropped custom animation with {} panels: {}", frame.len(), e);
                Delivery::Dropped(e.to_string())
            }
        }
    }

    /// Streams `frame` as one datagram, falling back to the reliable path.
    ///
    /// The datagram's transition is fixed: [`Transition::SMOOTH`] when
    /// `smooth`, zero otherwise. Without a negotiated channel, or when the
    /// datagram cannot be sent, the same colours go out once on the
    /// reliable path with no transition.
    pub async fn send_streaming(&self, frame: &Frame, smooth: bool) -> Delivery {
        let transition = if smooth {
            Transition::SMOOTH
        } else {
            Transition::NONE
        };

        let sent = match &*self.stream.read() {
            StreamLink::Enabled(channel) => {
                let datagram = frame.clone().with_transition(transition).encode_stream();
                Some(channel.send(&datagram))
            }
            StreamLink::Unattempted | StreamLink::Disabled => None,
        };

        match sent {
            Some(Ok(())) => Delivery::Streamed,
            Some(Err(e)) => {
                debug!("UDP send failed, using HTTP fallback: {}", e);
                self.send_reliable(&frame.clone().with_transition(Transition::NONE))
                    .await
            }
            None => {
                self.send_reliable(&frame.clone().with_transition(Transition::NONE))
                    .await
            }
        }
    }
}
