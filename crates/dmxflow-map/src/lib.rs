//! DmxFlow Map - Channel-to-Device Mapping Engine
//!
//! Declarative mapping of DMX channels onto smart-light device fields:
//! - [`catalog`] - field templates (`RGB`, `DimRGBCT`, ...) and discrete
//!   fields with capability requirements
//! - [`resolver`] - validation of mapping requests against device
//!   capabilities, duplicate-field and channel-overlap rules
//! - [`table`] - compiled per-universe 512-slot lookup table, published as
//!   an atomically-swapped copy-on-write snapshot
//!
//! Validation is all-or-nothing: a rejected request never partially applies
//! a mapping, and the compiled table only ever reflects accepted records.

#![warn(missing_docs)]

/// Device capability model and lookup
pub mod capabilities;
/// Field templates
pub mod catalog;
/// Error types
pub mod error;
/// Device fields and aliases
pub mod fields;
/// Persisted mapping records and requests
pub mod record;
/// Mapping validation and registry
pub mod resolver;
/// Compiled channel lookup table
pub mod table;

pub use capabilities::{CapabilityLookup, DeviceCapabilities, DeviceRegistry, DEFAULT_COLOR_TEMP_RANGE};
pub use catalog::Template;
pub use error::{MappingError, Result};
pub use fields::{Capability, DeviceField};
pub use record::{FieldMapping, MappingKind, MappingLayout, MappingRequest};
pub use resolver::MappingResolver;
pub use table::{CompiledTables, Slot, TableHandle};
