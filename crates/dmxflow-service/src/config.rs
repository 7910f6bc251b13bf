//! Runtime tuning for the processing engine

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs for the [`MappingService`](crate::service::MappingService).
///
/// All durations are configured in milliseconds. The defaults follow the
/// E1.31 source timeout and a debounce short enough to stay invisible next
/// to typical 40-44 Hz DMX refresh rates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// A source silent for longer than this stops competing (E1.31: 2500)
    pub source_timeout_ms: u64,
    /// Interval of the timeout sweep, bounding failover latency
    pub sweep_interval_ms: u64,
    /// Per-device quiet period before an accumulated update is emitted
    pub debounce_ms: u64,
    /// Merge priority assigned to Art-Net traffic, which carries none
    pub artnet_priority: u8,
    /// Emit still-pending updates when the service shuts down
    pub flush_on_shutdown: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 2500,
            sweep_interval_ms: 250,
            debounce_ms: 50,
            artnet_priority: 50,
            flush_on_shutdown: true,
        }
    }
}

impl ServiceConfig {
    /// Source timeout as a [`Duration`]
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    /// Sweep interval as a [`Duration`]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Debounce window as a [`Duration`]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_e131_timings() {
        let config = ServiceConfig::default();
        assert_eq!(config.source_timeout(), Duration::from_millis(2500));
        assert_eq!(config.sweep_interval(), Duration::from_millis(250));
        assert_eq!(config.debounce(), Duration::from_millis(50));
        assert_eq!(config.artnet_priority, 50);
        assert!(config.flush_on_shutdown);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{"debounce_ms": 20}"#).unwrap();
        assert_eq!(config.debounce_ms, 20);
        assert_eq!(config.source_timeout_ms, 2500);
    }
}
