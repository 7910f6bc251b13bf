//! Persisted bridge state
//!
//! One JSON file holds the device registry entries and the accepted mapping
//! records. The bridge loads it at startup; merger state and debounce
//! accumulators are deliberately not persisted, since live DMX traffic
//! repopulates them within a frame or two of a restart.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use dmxflow_map::{DeviceCapabilities, FieldMapping};

/// Current state file format version
pub const FILE_VERSION: u32 = 1;

/// Errors loading or saving the state file
#[derive(Error, Debug)]
pub enum StoreError {
    /// File read or write failure
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("state file parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// File written by an incompatible version
    #[error("state file version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build reads
        expected: u32,
        /// Version found in the file
        found: u32,
    },
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// On-disk bridge state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeFile {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Registered devices and their capabilities
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceCapabilities>,
    /// Accepted mapping records
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
}

fn default_version() -> u32 {
    FILE_VERSION
}

/// Load the state file, validating its format version
pub fn load(path: &Path) -> Result<BridgeFile> {
    let text = std::fs::read_to_string(path)?;
    let file: BridgeFile = serde_json::from_str(&text)?;
    if file.version != FILE_VERSION {
        return Err(StoreError::VersionMismatch {
            expected: FILE_VERSION,
            found: file.version,
        });
    }
    Ok(file)
}

/// Load the state file, starting empty when it does not exist yet
pub fn load_or_default(path: &Path) -> Result<BridgeFile> {
    if !path.exists() {
        info!(path = %path.display(), "no state file, starting empty");
        return Ok(BridgeFile {
            version: FILE_VERSION,
            ..BridgeFile::default()
        });
    }
    let file = load(path)?;
    info!(
        path = %path.display(),
        devices = file.devices.len(),
        mappings = file.mappings.len(),
        "state file loaded"
    );
    Ok(file)
}

/// Write the state file
pub fn save(path: &Path, file: &BridgeFile) -> Result<()> {
    let text = serde_json::to_string_pretty(file)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmxflow_map::{DeviceRegistry, MappingRequest, MappingResolver};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn state_round_trips_through_json() {
        let registry = Arc::new(DeviceRegistry::new());
        registry.insert("lamp", DeviceCapabilities::rgbct(Some((2700, 6500))));
        let resolver = MappingResolver::new(registry);
        resolver
            .create(MappingRequest::template("lamp", 1, 1, "DimRGBCT"))
            .unwrap();

        let mut devices = BTreeMap::new();
        devices.insert(
            "lamp".to_string(),
            DeviceCapabilities::rgbct(Some((2700, 6500))),
        );
        let file = BridgeFile {
            version: FILE_VERSION,
            devices,
            mappings: resolver.records(),
        };

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dmxflow.json");
        save(&path, &file).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.devices.len(), 1);
        assert_eq!(loaded.mappings, file.mappings);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dmxflow.json");
        let file = BridgeFile {
            version: 99,
            ..BridgeFile::default()
        };
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let result = load(&path);
        assert!(matches!(
            result,
            Err(StoreError::VersionMismatch {
                expected: FILE_VERSION,
                found: 99
            })
        ));
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let file = load_or_default(&dir.path().join("missing.json")).unwrap();
        assert_eq!(file.version, FILE_VERSION);
        assert!(file.devices.is_empty());
        assert!(file.mappings.is_empty());
    }
}
