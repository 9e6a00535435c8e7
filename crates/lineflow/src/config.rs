//! Configuration file
//!
//! ```toml
//! [device]
//! host = "192.168.1.40"
//! token = "..."
//!
//! [groups]
//! create_groups = true
//! group_size = 3
//! manual = "0,1,2; 3,4,5"
//!
//! [polling]
//! interval_secs = 10
//!
//! [logging]
//! level = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use lineflow_control::{DeviceConfig, IntegrationOptions, DEFAULT_API_PORT, DEFAULT_STREAM_PORT};
use lineflow_core::{CoreError, ManualGroups, DEFAULT_GROUP_SIZE};
use serde::{Deserialize, Serialize};
use tracing::Level;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub device: DeviceSection,
    pub groups: GroupSection,
    pub polling: PollingSection,
    pub logging: LogConfig,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceSection {
    pub host: String,
    pub token: String,
    pub port: u16,
    pub stream_port: u16,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: String::new(),
            port: DEFAULT_API_PORT,
            stream_port: DEFAULT_STREAM_PORT,
        }
    }
}

impl std::fmt::Debug for DeviceSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSection")
            .field("host", &self.host)
            .field("token", &"***REDACTED***")
            .field("port", &self.port)
            .field("stream_port", &self.stream_port)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupSection {
    pub create_groups: bool,
    pub group_size: usize,
    /// Segment indices in layout order, e.g. `"0,1,2; 3,4,5"`. Empty for
    /// automatic grouping.
    pub manual: String,
}

impl Default for GroupSection {
    fn default() -> Self {
        Self {
            create_groups: true,
            group_size: DEFAULT_GROUP_SIZE,
            manual: String::new(),
        }
    }
}

impl GroupSection {
    pub fn manual_groups(&self) -> Result<Option<ManualGroups>, CoreError> {
        let groups: ManualGroups = self.manual.parse()?;
        Ok((!groups.is_empty()).then_some(groups))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingSection {
    pub interval_secs: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// Logging options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
    /// Defaults to `<data_dir>/lineflow/logs`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// Log files kept when rotating
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: None,
            max_files: 5,
        }
    }
}

impl LogConfig {
    pub fn parse_level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("lineflow")
                .join("logs")
        })
    }

    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        if self.file_output {
            fs::create_dir_all(self.log_dir())?;
        }
        Ok(())
    }

    /// One file per process, named after the start time.
    pub fn current_log_path(&self) -> PathBuf {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.log_dir().join(format!("lineflow-{}.log", secs))
    }

    /// Deletes the oldest `lineflow-*.log` files beyond `max_files - 1`,
    /// leaving room for the file about to be created.
    pub fn cleanup_old_logs(&self) -> std::io::Result<()> {
        if !self.file_output {
            return Ok(());
        }
        let dir = self.log_dir();
        if !dir.exists() {
            return Ok(());
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("lineflow-") && n.ends_with(".log"))
            })
            .collect();
        // Timestamped names sort chronologically.
        logs.sort();

        let keep = self.max_files.saturating_sub(1);
        if logs.len() > keep {
            for old in &logs[..logs.len() - keep] {
                fs::remove_file(old)?;
            }
        }
        Ok(())
    }
}

impl AppConfig {
    /// `<config_dir>/lineflow/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lineflow").join("config.toml"))
    }

    /// Reads `path`, or returns defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.groups.manual_groups()?;
        Ok(())
    }

    /// Replaces the manual group string. On a parse error nothing changes.
    pub fn set_manual_groups(&mut self, manual: &str) -> Result<(), CoreError> {
        let groups: ManualGroups = manual.parse()?;
        self.groups.manual = groups.to_string();
        Ok(())
    }

    pub fn device_config(&self) -> Result<DeviceConfig> {
        if self.device.host.is_empty() {
            anyhow::bail!("No device host configured. Set [device] host in the config file.");
        }
        let mut config = DeviceConfig::new(self.device.host.clone(), self.device.token.clone());
        config.port = self.device.port;
        config.stream_port = self.device.stream_port;
        Ok(config)
    }

    pub fn integration_options(&self) -> Result<IntegrationOptions> {
        Ok(IntegrationOptions {
            create_groups: self.groups.create_groups,
            group_size: self.groups.group_size,
            manual_groups: self.groups.manual_groups()?,
            poll_interval: Duration::from_secs(self.polling.interval_secs.max(1)),
        })
    }
}
