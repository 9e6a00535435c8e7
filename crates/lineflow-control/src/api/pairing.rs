use crate::error::{DeviceError, Result};
use crate::models::NewTokenResponse;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::info;

/// The device holds the pairing request open while it waits for the button.
pub const PAIRING_TIMEOUT: Duration = Duration::from_secs(30);

/// Requests a new access token with `POST /api/v1/new`.
///
/// Only succeeds while the device is in pairing mode (power button held
/// for 5-7 seconds). Outside that window the device answers 403, reported
/// as [`DeviceError::PairingTimeout`].
pub async fn pair_new_token(host: &str, port: u16) -> Result<String> {
    let client = reqwest::Client::builder().build()?;

    let url = format!("http://{}:{}/api/v1/new", host, port);
    let resp = match client.post(&url).timeout(PAIRING_TIMEOUT).send().await {
        Ok(resp) => resp,
        Err(e) if e.is_timeout() => return Err(DeviceError::PairingTimeout),
        Err(e) => return Err(e.into()),
    };

    if resp.status() == StatusCode::FORBIDDEN {
        return Err(DeviceError::PairingTimeout);
    }
    if !resp.status().is_success() {
        return Err(DeviceError::Api(format!(
            "Failed to create token: HTTP {}",
            resp.status()
        )));
    }

    let body: NewTokenResponse = resp.json().await?;
    body.auth_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DeviceError::Api("Response contains no auth_token".to_string()))
}

/// Retries [`pair_new_token`] until the device issues a token or `window`
/// elapses. Errors other than a closed pairing window fail immediately.
pub async fn pair_within(host: &str, port: u16, window: Duration, poll: Duration) -> Result<String> {
    info!("Waiting for pairing confirmation on {} ({}s window)...", host, window.as_secs());

    let start_time = Instant::now();
    loop {
        match pair_new_token(host, port).await {
            Ok(token) => {
                info!("Paired with {}", host);
                return Ok(token);
            }
            Err(DeviceError::PairingTimeout) => {
                let elapsed = start_time.elapsed();
                if elapsed + poll >= window {
                    return Err(DeviceError::PairingTimeout);
                }
                info!(
                    "Device not in pairing mode yet ({}s/{}s). Retrying...",
                    elapsed.as_secs(),
                    window.as_secs()
                );
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(poll).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_token_response() {
        let body: NewTokenResponse =
            serde_json::from_value(json!({ "auth_token": "abcdef" })).unwrap();
        assert_eq!(body.auth_token.as_deref(), Some("abcdef"));
    }

    #[test]
    fn test_parse_token_response_without_token() {
        let body: NewTokenResponse = serde_json::from_value(json!({})).unwrap();
        assert!(body.auth_token.is_none());
    }
}
