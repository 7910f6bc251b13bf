//! Error types for mapping validation
use thiserror::Error;
use uuid::Uuid;

/// Structured mapping validation errors.
///
/// Each variant corresponds to one rule a mapping request can violate;
/// requests are rejected synchronously and never partially applied.
#[derive(Error, Debug)]
pub enum MappingError {
    /// Template name not in the catalogue
    #[error("unknown template '{name}'; supported templates: {supported}")]
    UnknownTemplate {
        /// Requested template name
        name: String,
        /// Comma-separated supported template names
        supported: String,
    },

    /// Field name (after alias normalization) not supported
    #[error("unsupported field '{name}'; supported fields: {supported}")]
    UnsupportedField {
        /// Requested field name
        name: String,
        /// Comma-separated supported field names
        supported: String,
    },

    /// Explicit field list was empty
    #[error("at least one field is required")]
    EmptyFields,

    /// Device lacks a capability the requested fields need
    #[error("device '{device_id}' lacks {missing} support (supported: {supported})")]
    MissingCapability {
        /// Target device
        device_id: String,
        /// Comma-separated missing capability names
        missing: String,
        /// Summary of what the device does support
        supported: String,
    },

    /// A requested field is already mapped for this device and universe
    #[error("field(s) already mapped for device '{device_id}' on universe {universe}: {fields}")]
    DuplicateField {
        /// Target device
        device_id: String,
        /// Universe the conflict occurred on
        universe: u16,
        /// Comma-separated conflicting field names
        fields: String,
    },

    /// Candidate channel range overlaps an existing mapping
    #[error(
        "channels {channel}-{end} on universe {universe} overlap mapping for device \
         '{other_device}' at {other_channel}-{other_end}"
    )]
    ChannelOverlap {
        /// Universe the overlap occurred on
        universe: u16,
        /// Requested start channel
        channel: u16,
        /// Requested end channel
        end: u16,
        /// Device owning the conflicting mapping
        other_device: String,
        /// Conflicting mapping's start channel
        other_channel: u16,
        /// Conflicting mapping's end channel
        other_end: u16,
    },

    /// Device id not present in the registry
    #[error("device not found: '{0}'")]
    UnknownDevice(String),

    /// Mapping id not present in the registry
    #[error("mapping not found: {0}")]
    UnknownMapping(Uuid),

    /// Channel range does not fit within 1-512
    #[error("channels {channel}..{channel}+{length} must fall within 1-512")]
    InvalidChannelRange {
        /// Requested start channel
        channel: u16,
        /// Requested length
        length: u16,
    },

    /// Universe outside 0-63999
    #[error("invalid universe: {0} (must be 0-63999)")]
    InvalidUniverse(u16),
}

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, MappingError>;
