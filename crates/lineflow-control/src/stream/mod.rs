//! Streaming channel
//!
//! Once the device is switched into external control it accepts colour
//! frames as single UDP datagrams. Nothing is ever read back.

pub mod channel;

pub use channel::{resolve, StreamChannel};

/// Negotiation state of the streaming channel.
///
/// `Unattempted` moves to `Enabled` or `Disabled` exactly once per session.
/// A failed send falls back for that frame only and leaves the state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Unattempted,
    Enabled,
    Disabled,
}
