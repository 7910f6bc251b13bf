//! Error types for the DMX core
use thiserror::Error;

/// DMX frame and merger errors
#[derive(Error, Debug)]
pub enum DmxError {
    /// Frame payload does not fit into 512 channels
    #[error("DMX frame must carry at most 512 channels, got {got}")]
    MalformedFrame {
        /// Number of channel bytes in the offending payload
        got: usize,
    },

    /// Merge priority outside the sACN 0-200 range
    #[error("DMX priority must be 0-200, got {0}")]
    InvalidPriority(u8),

    /// Universe number outside the valid range
    #[error("invalid DMX universe: {0} (must be 0-63999)")]
    InvalidUniverse(u32),
}

/// Result type for DMX core operations
pub type Result<T> = std::result::Result<T, DmxError>;
