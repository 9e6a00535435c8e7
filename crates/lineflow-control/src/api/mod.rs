//! Control-plane HTTP API

pub mod client;
pub mod pairing;

pub use client::{validate_connection, DeviceClient, NEGOTIATE_TIMEOUT, READ_TIMEOUT, WRITE_TIMEOUT};
pub use pairing::{pair_new_token, pair_within, PAIRING_TIMEOUT};
