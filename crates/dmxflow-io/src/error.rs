//! Error types for the input listeners
use thiserror::Error;

/// Errors from binding or reading the DMX input sockets
#[derive(Error, Debug)]
pub enum IoError {
    /// Socket setup or receive failure
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// A decoded packet produced an invalid frame
    #[error(transparent)]
    Frame(#[from] dmxflow_core::DmxError),
}

/// Result type for listener operations
pub type Result<T> = std::result::Result<T, IoError>;
