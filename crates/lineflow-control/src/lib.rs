//! Lineflow Control - Device session for segmented line fixtures
//!
//! This crate talks to the fixture controller:
//! - **API**: token pairing, layout and state reads, effect writes over HTTP
//! - **Streaming**: colour frames as UDP datagrams after external control
//!   has been negotiated
//! - **Transport**: picks the path per frame and falls back to HTTP
//! - **Entities**: one light per segment and one per group, fed by a
//!   polling coordinator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lineflow_control::{DeviceConfig, Integration, IntegrationOptions, TurnOn};
//! use lineflow_core::Rgb;
//!
//! # async fn run() -> lineflow_control::Result<()> {
//! let config = DeviceConfig::new("192.168.1.40", "token");
//! let integration = Integration::setup(config, IntegrationOptions::default()).await?;
//! integration.segments()[0].turn_on(TurnOn::color(Rgb::new(255, 0, 0))).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - HTTP control plane and pairing
//! - [`stream`] - UDP streaming channel
//! - [`transport`] - Reliable and streaming dispatch
//! - [`session`] - Per-fixture session
//! - [`coordinator`] - State polling
//! - [`entity`] - Segment and group lights
//! - [`integration`] - Setup of all of the above
//! - [`error`] - Error types

#![allow(missing_docs)]

pub mod api;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod integration;
pub mod models;
pub mod session;
pub mod stream;
pub mod transport;

// Re-exports
pub use api::{pair_new_token, pair_within, validate_connection, DeviceClient, PAIRING_TIMEOUT};
pub use coordinator::{Coordinator, DeviceSnapshot, DEFAULT_POLL_INTERVAL};
pub use entity::{GroupAttributes, SegmentAttributes, SegmentGroup, SegmentLight, TurnOn};
pub use error::{DeviceError, Result};
pub use integration::{Integration, IntegrationOptions};
pub use models::{DeviceConfig, DeviceInfo, StateUpdate, DEFAULT_API_PORT, DEFAULT_STREAM_PORT};
pub use session::DeviceSession;
pub use stream::{StreamChannel, StreamStatus};
pub use transport::{Delivery, Dispatcher};
