use serde::{Deserialize, Serialize};

/// Management API port of the fixture controller.
pub const DEFAULT_API_PORT: u16 = 16021;
/// Documented external-control datagram port.
pub const DEFAULT_STREAM_PORT: u16 = 60222;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceConfig {
    pub host: String,
    pub token: String, // Path segment of every authenticated request
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_stream_port")]
    pub stream_port: u16, // Used when the device does not report its own
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_stream_port() -> u16 {
    DEFAULT_STREAM_PORT
}

impl DeviceConfig {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            port: DEFAULT_API_PORT,
            stream_port: DEFAULT_STREAM_PORT,
        }
    }

    /// `http://{host}:{port}/api/v1/{token}`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/api/v1/{}", self.host, self.port, self.token)
    }
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("host", &self.host)
            .field("token", &"***REDACTED***")
            .field("port", &self.port)
            .field("stream_port", &self.stream_port)
            .finish()
    }
}

/// `{"value": ...}` wrapper used throughout the device API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueField<T> {
    pub value: T,
}

/// Global state block, as nested under `state` in the root document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalState {
    #[serde(default)]
    pub on: Option<ValueField<bool>>,
    #[serde(default)]
    pub brightness: Option<ValueField<u16>>,
}

/// Body of `GET /` (device info plus global state).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub firmware_version: String,
    #[serde(default)]
    pub on: Option<ValueField<bool>>,
    #[serde(default)]
    pub brightness: Option<ValueField<u16>>,
    #[serde(default)]
    pub state: Option<GlobalState>,
    #[serde(default)]
    pub stream_control_port: Option<u16>,
}

impl DeviceInfo {
    /// Global on flag; top-level `on` first, then `state.on`, else on.
    pub fn is_on(&self) -> bool {
        self.on
            .or_else(|| self.state.as_ref().and_then(|s| s.on))
            .map(|v| v.value)
            .unwrap_or(true)
    }

    pub fn brightness(&self) -> Option<u16> {
        self.brightness
            .or_else(|| self.state.as_ref().and_then(|s| s.brightness))
            .map(|v| v.value)
    }
}

/// Body of `PUT /state`. Absent fields are left alone by the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<ValueField<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<ValueField<u16>>,
}

impl StateUpdate {
    pub fn new(on: Option<bool>, brightness: Option<u16>) -> Self {
        Self {
            on: on.map(|value| ValueField { value }),
            brightness: brightness.map(|value| ValueField { value }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.on.is_none() && self.brightness.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewTokenResponse {
    #[serde(default)]
    pub auth_token: Option<String>,
}
