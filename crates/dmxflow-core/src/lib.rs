//! DmxFlow Core - Protocol-Agnostic DMX Model
//!
//! This crate contains the protocol-agnostic core of the DMX-to-LAN bridge:
//! - [`DmxFrame`]: one universe's worth of DMX data plus merge metadata
//! - [`SourceKey`]: identity of a DMX producer (sACN CID, unified ArtNet)
//! - [`PriorityMerger`]: per-universe Highest-Takes-Priority arbitration
//!   with timeout-based failover
//!
//! Input decoders (Art-Net, sACN) build [`DmxFrame`]s and feed them to the
//! merger; everything downstream of the merger consumes the single winning
//! frame per universe.

#![warn(missing_docs)]

/// Error types
pub mod error;
/// DMX frame and source identity
pub mod frame;
/// Priority-based source arbitration
pub mod merger;

pub use error::{DmxError, Result};
pub use frame::{DmxFrame, Protocol, SourceKey, SourceOrigin, DMX_CHANNELS, MAX_PRIORITY, MAX_UNIVERSE};
pub use merger::{MergerConfig, PriorityMerger};
