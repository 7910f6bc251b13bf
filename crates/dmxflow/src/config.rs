//! Bridge configuration file
//!
//! TOML configuration with full defaults: a missing file or any omitted
//! section runs the bridge with standard ports and timings.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dmxflow_io::{ARTNET_PORT, SACN_PORT};
use dmxflow_service::ServiceConfig;

/// Top-level bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Art-Net listener settings
    pub artnet: ArtNetConfig,
    /// sACN listener settings
    pub sacn: SacnConfig,
    /// Processing engine tuning
    pub service: ServiceConfig,
    /// Persisted state location
    pub store: StoreConfig,
    /// Logging settings
    pub log: LogConfig,
}

/// Art-Net listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtNetConfig {
    /// Whether the Art-Net listener runs
    pub enabled: bool,
    /// Listen address
    pub bind: SocketAddr,
}

impl Default for ArtNetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: SocketAddr::from(([0, 0, 0, 0], ARTNET_PORT)),
        }
    }
}

/// sACN listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SacnConfig {
    /// Whether the sACN listener runs
    pub enabled: bool,
    /// Listen address
    pub bind: SocketAddr,
    /// Universes whose multicast groups to join
    pub universes: Vec<u16>,
}

impl Default for SacnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: SocketAddr::from(([0, 0, 0, 0], SACN_PORT)),
            universes: vec![1],
        }
    }
}

/// Persisted state location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the devices-and-mappings file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dmxflow.json"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level (`RUST_LOG` takes precedence)
    pub level: String,
    /// Optional log file next to console output
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_well_known_ports() {
        let config = BridgeConfig::default();
        assert!(config.artnet.enabled);
        assert_eq!(config.artnet.bind.port(), 6454);
        assert_eq!(config.sacn.bind.port(), 5568);
        assert_eq!(config.sacn.universes, vec![1]);
        assert_eq!(config.service.debounce_ms, 50);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [sacn]
            universes = [1, 2, 7]

            [service]
            artnet_priority = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.sacn.universes, vec![1, 2, 7]);
        assert_eq!(config.service.artnet_priority, 25);
        assert_eq!(config.service.source_timeout_ms, 2500);
        assert!(config.artnet.enabled);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = BridgeConfig::load(Path::new("/nonexistent/dmxflow.toml")).unwrap();
        assert_eq!(config.log.level, "info");
    }
}
