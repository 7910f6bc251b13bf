//! DmxFlow Service - Frame Processing Engine
//!
//! Ties the input side to the output side of the bridge: merged DMX frames
//! are matched against the compiled mapping table, changed channel values
//! decode into device field values, and a per-device debounce coalesces
//! bursts (DMX streams run near 40-44 Hz) into individual outbound updates.
//!
//! The service emits [`DeviceUpdate`]s through an [`UpdateSink`]; actually
//! delivering them to devices on the LAN is the embedding application's job.

#![warn(missing_docs)]

/// Runtime tuning knobs
pub mod config;
/// Per-device debounce and change detection
pub mod debounce;
/// Channel byte to field value decoding
pub mod decode;
/// The frame processing service
pub mod service;
/// Outbound update types and sink trait
pub mod sink;

pub use config::ServiceConfig;
pub use service::MappingService;
pub use sink::{DeviceUpdate, FieldValue, UpdateSink};
