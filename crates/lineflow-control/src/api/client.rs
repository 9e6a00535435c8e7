use crate::error::{DeviceError, Result};
use crate::models::{DeviceConfig, DeviceInfo, StateUpdate};
use lineflow_core::{EffectCommand, LayoutDocument};
use reqwest::{Response, StatusCode};
use std::time::Duration;

/// Upper bound for control-plane reads.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound for a single colour command.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(500);
/// Upper bound for each step of streaming negotiation.
pub const NEGOTIATE_TIMEOUT: Duration = Duration::from_secs(3);

/// Control-plane client bound to one device and token.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    config: DeviceConfig,
    base_url: String,
    http: reqwest::Client,
}

impl DeviceClient {
    pub fn new(config: DeviceConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: config.base_url(),
            config,
            http,
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `GET /panelLayout/layout`.
    pub async fn get_layout(&self) -> Result<LayoutDocument> {
        let url = format!("{}/panelLayout/layout", self.base_url);
        let resp = self.http.get(&url).timeout(READ_TIMEOUT).send().await?;
        let resp = check_status(resp, "fetch layout")?;

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            DeviceError::DeviceUnreachable(format!("Layout response is not a panel layout: {}", e))
        })
    }

    /// Fetches the root document (device info and global state).
    pub async fn get_info(&self) -> Result<DeviceInfo> {
        self.get_info_with_timeout(READ_TIMEOUT).await
    }

    pub(crate) async fn get_info_with_timeout(&self, timeout: Duration) -> Result<DeviceInfo> {
        let resp = self.http.get(&self.base_url).timeout(timeout).send().await?;
        let resp = check_status(resp, "fetch device state")?;
        Ok(resp.json().await?)
    }

    /// Writes global on/off and brightness. An empty update sends nothing.
    pub async fn set_state(&self, update: &StateUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let url = format!("{}/state", self.base_url);
        let resp = self
            .http
            .put(&url)
            .json(update)
            .timeout(READ_TIMEOUT)
            .send()
            .await?;
        check_status(resp, "set state")?;
        Ok(())
    }

    /// Writes `PUT /effects` and returns the device's status code.
    pub async fn write_effect(&self, command: &EffectCommand, timeout: Duration) -> Result<StatusCode> {
        let url = format!("{}/effects", self.base_url);
        let resp = self
            .http
            .put(&url)
            .json(command)
            .timeout(timeout)
            .send()
            .await?;
        Ok(check_status(resp, "write effect")?.status())
    }

    /// Checks that the token is accepted and the device serves a layout.
    pub async fn validate(&self) -> Result<()> {
        self.get_layout().await.map(|_| ())
    }
}

/// Checks host and token before a session is created.
pub async fn validate_connection(config: &DeviceConfig) -> Result<()> {
    DeviceClient::new(config.clone())?.validate().await
}

fn check_status(resp: Response, action: &str) -> Result<Response> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(DeviceError::Auth);
    }
    if !status.is_success() {
        return Err(DeviceError::Api(format!(
            "Failed to {}: HTTP {}",
            action, status
        )));
    }
    Ok(resp)
}
