//! Compiled channel lookup table
//!
//! The engine never walks mapping records on the hot path. Accepted records
//! compile into a flat 512-slot array per universe, published through an
//! [`arc_swap::ArcSwap`]: frame processing loads the `Arc` once per frame,
//! configuration edits install a fresh table with a single pointer swap, and
//! in-flight frames finish against the snapshot they started with.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dmxflow_core::DMX_CHANNELS;

use crate::fields::DeviceField;
use crate::record::FieldMapping;

/// One compiled channel slot: which device field this channel drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Target device
    pub device_id: Arc<str>,
    /// Field the channel's byte decodes into
    pub field: DeviceField,
}

/// Flat 512-slot table for one universe
#[derive(Debug, Clone)]
pub struct UniverseTable {
    slots: Vec<Option<Slot>>,
}

impl UniverseTable {
    fn empty() -> Self {
        Self {
            slots: vec![None; DMX_CHANNELS],
        }
    }

    /// O(1) lookup by 1-indexed DMX channel
    pub fn lookup(&self, channel: u16) -> Option<&Slot> {
        if channel == 0 || channel as usize > DMX_CHANNELS {
            return None;
        }
        self.slots[channel as usize - 1].as_ref()
    }

    /// Iterate occupied slots as (1-indexed channel, slot)
    pub fn entries(&self) -> impl Iterator<Item = (u16, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|slot| (index as u16 + 1, slot)))
    }
}

/// Immutable compiled snapshot of every universe's mapping table
#[derive(Debug, Clone)]
pub struct CompiledTables {
    generation: u64,
    universes: HashMap<u16, UniverseTable>,
    mapped: HashSet<(Arc<str>, DeviceField)>,
}

impl CompiledTables {
    /// The empty table, generation zero
    pub fn empty() -> Self {
        Self {
            generation: 0,
            universes: HashMap::new(),
            mapped: HashSet::new(),
        }
    }

    /// Compile a record set into a fresh snapshot.
    ///
    /// With `allow_overlap`, later records win contested slots; record order
    /// is creation order, making the outcome deterministic.
    pub fn build(records: &[FieldMapping], generation: u64) -> Self {
        let mut universes: HashMap<u16, UniverseTable> = HashMap::new();
        let mut mapped = HashSet::new();
        for record in records {
            let device_id: Arc<str> = Arc::from(record.device_id.as_str());
            let table = universes
                .entry(record.universe)
                .or_insert_with(UniverseTable::empty);
            for (offset, field) in record.fields.iter().enumerate() {
                let index = record.channel as usize - 1 + offset;
                if index >= DMX_CHANNELS {
                    break;
                }
                table.slots[index] = Some(Slot {
                    device_id: device_id.clone(),
                    field: *field,
                });
                mapped.insert((device_id.clone(), *field));
            }
        }
        Self {
            generation,
            universes,
            mapped,
        }
    }

    /// Monotonic rebuild counter; a changed generation signals a swap
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The compiled table for a universe, if it has any mapping
    pub fn universe(&self, universe: u16) -> Option<&UniverseTable> {
        self.universes.get(&universe)
    }

    /// O(1) lookup by universe and 1-indexed channel
    pub fn lookup(&self, universe: u16, channel: u16) -> Option<&Slot> {
        self.universes.get(&universe)?.lookup(channel)
    }

    /// Whether any slot maps this (device, field) pair
    pub fn is_mapped(&self, device_id: &str, field: DeviceField) -> bool {
        // Only hit on table swaps, never per frame.
        self.mapped
            .iter()
            .any(|(id, mapped_field)| id.as_ref() == device_id && *mapped_field == field)
    }

    /// Universes with at least one compiled slot, sorted
    pub fn mapped_universes(&self) -> Vec<u16> {
        let mut universes: Vec<u16> = self.universes.keys().copied().collect();
        universes.sort_unstable();
        universes
    }
}

/// Shared handle to the current compiled snapshot.
///
/// Cloned freely; readers call [`load`](TableHandle::load) once per frame,
/// the resolver swaps in rebuilt tables.
#[derive(Clone)]
pub struct TableHandle(Arc<ArcSwap<CompiledTables>>);

impl TableHandle {
    /// A handle starting at the empty table
    pub fn new() -> Self {
        Self(Arc::new(ArcSwap::from_pointee(CompiledTables::empty())))
    }

    /// Load the current snapshot
    pub fn load(&self) -> Arc<CompiledTables> {
        self.0.load_full()
    }

    /// Atomically install a new snapshot
    pub(crate) fn store(&self, tables: CompiledTables) {
        self.0.store(Arc::new(tables));
    }
}

impl Default for TableHandle {
    fn default() -> Self {
        Self::new()
    }
}
