//! Mapping validation and registry
//!
//! The resolver owns the accepted mapping records, validates every create /
//! update / delete from the management layer, and republishes the compiled
//! lookup table after each accepted change. Validation is all-or-nothing: a
//! rejected request leaves both the record set and the published table
//! untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use dmxflow_core::MAX_UNIVERSE;

use crate::capabilities::CapabilityLookup;
use crate::catalog::Template;
use crate::error::{MappingError, Result};
use crate::fields::DeviceField;
use crate::record::{FieldMapping, MappingKind, MappingLayout, MappingRequest};
use crate::table::{CompiledTables, TableHandle};

struct ResolverState {
    records: Vec<FieldMapping>,
    generation: u64,
}

/// Validates mapping requests and maintains the compiled table.
pub struct MappingResolver {
    capabilities: Arc<dyn CapabilityLookup>,
    state: Mutex<ResolverState>,
    tables: TableHandle,
}

impl MappingResolver {
    /// Create a resolver backed by the given capability lookup
    pub fn new(capabilities: Arc<dyn CapabilityLookup>) -> Self {
        Self {
            capabilities,
            state: Mutex::new(ResolverState {
                records: Vec::new(),
                generation: 0,
            }),
            tables: TableHandle::new(),
        }
    }

    /// Handle to the published compiled table
    pub fn tables(&self) -> TableHandle {
        self.tables.clone()
    }

    /// Validate and apply a mapping creation request.
    ///
    /// Fields are assigned in order to consecutive channels from the
    /// requested start; on success the compiled table is rebuilt and
    /// atomically swapped in.
    pub fn create(&self, request: MappingRequest) -> Result<FieldMapping> {
        let mut state = self.state.lock();
        let (kind, fields) = self.validate(&state, &request, None)?;
        let now = Utc::now();
        let record = FieldMapping {
            id: Uuid::new_v4(),
            device_id: request.device_id,
            universe: request.universe,
            channel: request.channel,
            length: fields.len() as u16,
            kind,
            field: match kind {
                MappingKind::Discrete => fields.first().copied(),
                MappingKind::Range => None,
            },
            fields,
            allow_overlap: request.allow_overlap,
            created_at: now,
            updated_at: now,
        };
        state.records.push(record.clone());
        self.rebuild(&mut state);
        info!(
            mapping_id = %record.id,
            device_id = %record.device_id,
            universe = record.universe,
            channel = record.channel,
            length = record.length,
            "created mapping"
        );
        Ok(record)
    }

    /// Re-validate and replace an existing mapping.
    ///
    /// The record itself is excluded from duplicate-field and overlap
    /// checks, so a mapping can be moved without conflicting with itself.
    pub fn update(&self, id: Uuid, request: MappingRequest) -> Result<FieldMapping> {
        let mut state = self.state.lock();
        let index = state
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(MappingError::UnknownMapping(id))?;
        let (kind, fields) = self.validate(&state, &request, Some(id))?;
        let previous = &state.records[index];
        let record = FieldMapping {
            id,
            device_id: request.device_id,
            universe: request.universe,
            channel: request.channel,
            length: fields.len() as u16,
            kind,
            field: match kind {
                MappingKind::Discrete => fields.first().copied(),
                MappingKind::Range => None,
            },
            fields,
            allow_overlap: request.allow_overlap,
            created_at: previous.created_at,
            updated_at: Utc::now(),
        };
        state.records[index] = record.clone();
        self.rebuild(&mut state);
        info!(
            mapping_id = %id,
            device_id = %record.device_id,
            universe = record.universe,
            channel = record.channel,
            "updated mapping"
        );
        Ok(record)
    }

    /// Delete a mapping, returning whether it existed
    pub fn delete(&self, id: Uuid) -> bool {
        let mut state = self.state.lock();
        let before = state.records.len();
        state.records.retain(|record| record.id != id);
        if state.records.len() == before {
            return false;
        }
        self.rebuild(&mut state);
        info!(mapping_id = %id, "deleted mapping");
        true
    }

    /// Re-validate and load persisted records, skipping invalid ones.
    ///
    /// Records that no longer validate (deleted devices, capability
    /// changes) are logged and dropped rather than failing the whole load.
    /// Returns the number of records loaded.
    pub fn restore(&self, records: Vec<FieldMapping>) -> usize {
        let mut state = self.state.lock();
        let mut loaded = 0;
        for record in records {
            let layout = match record.kind {
                MappingKind::Discrete => match record.field.or_else(|| record.fields.first().copied())
                {
                    Some(field) => MappingLayout::Discrete(field.as_str().to_string()),
                    None => {
                        warn!(mapping_id = %record.id, "skipping mapping: discrete mapping missing field");
                        continue;
                    }
                },
                MappingKind::Range => MappingLayout::Fields(
                    record
                        .fields
                        .iter()
                        .map(|field| field.as_str().to_string())
                        .collect(),
                ),
            };
            let request = MappingRequest {
                device_id: record.device_id.clone(),
                universe: record.universe,
                channel: record.channel,
                layout,
                allow_overlap: record.allow_overlap,
            };
            match self.validate(&state, &request, None) {
                Ok(_) => {
                    state.records.push(record);
                    loaded += 1;
                }
                Err(err) => {
                    warn!(mapping_id = %record.id, error = %err, "skipping persisted mapping");
                }
            }
        }
        self.rebuild(&mut state);
        info!(count = loaded, "restored mappings");
        loaded
    }

    /// Snapshot of the current record set, in creation order
    pub fn records(&self) -> Vec<FieldMapping> {
        self.state.lock().records.clone()
    }

    /// Number of accepted mappings
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Whether no mappings are configured
    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    fn rebuild(&self, state: &mut ResolverState) {
        state.generation += 1;
        self.tables
            .store(CompiledTables::build(&state.records, state.generation));
    }

    /// Full validation pipeline for one request; read-only on `state`.
    fn validate(
        &self,
        state: &ResolverState,
        request: &MappingRequest,
        exclude: Option<Uuid>,
    ) -> Result<(MappingKind, Vec<DeviceField>)> {
        if request.universe > MAX_UNIVERSE {
            return Err(MappingError::InvalidUniverse(request.universe));
        }

        let (kind, fields) = resolve_layout(request)?;
        let length = fields.len() as u16;
        if request.channel == 0 || request.channel as u32 + length as u32 - 1 > 512 {
            return Err(MappingError::InvalidChannelRange {
                channel: request.channel,
                length,
            });
        }

        let capabilities = self
            .capabilities
            .capabilities(&request.device_id)
            .ok_or_else(|| MappingError::UnknownDevice(request.device_id.clone()))?;

        let missing: BTreeSet<_> = fields
            .iter()
            .filter_map(|field| field.requirement())
            .filter(|capability| !capabilities.supports(*capability))
            .collect();
        if !missing.is_empty() {
            return Err(MappingError::MissingCapability {
                device_id: request.device_id.clone(),
                missing: missing
                    .iter()
                    .map(|capability| capability.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                supported: capabilities.describe(),
            });
        }

        // Duplicate fields are checked per (device, universe), independent
        // of channel position.
        let conflicts: BTreeSet<_> = state
            .records
            .iter()
            .filter(|record| {
                Some(record.id) != exclude
                    && record.device_id == request.device_id
                    && record.universe == request.universe
            })
            .flat_map(|record| record.fields.iter().copied())
            .filter(|field| fields.contains(field))
            .collect();
        if !conflicts.is_empty() {
            return Err(MappingError::DuplicateField {
                device_id: request.device_id.clone(),
                universe: request.universe,
                fields: conflicts
                    .iter()
                    .map(|field| field.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        if !request.allow_overlap {
            // Any device's mapping on the same universe blocks the range.
            if let Some(other) = state.records.iter().find(|record| {
                Some(record.id) != exclude
                    && record.universe == request.universe
                    && record.overlaps(request.channel, length)
            }) {
                return Err(MappingError::ChannelOverlap {
                    universe: request.universe,
                    channel: request.channel,
                    end: request.channel + length - 1,
                    other_device: other.device_id.clone(),
                    other_channel: other.channel,
                    other_end: other.end_channel(),
                });
            }
        }

        Ok((kind, fields))
    }
}

/// Resolve a requested layout into an ordered field list
fn resolve_layout(request: &MappingRequest) -> Result<(MappingKind, Vec<DeviceField>)> {
    match &request.layout {
        MappingLayout::Template(name) => Ok((
            MappingKind::Range,
            Template::parse(name)?.fields().to_vec(),
        )),
        MappingLayout::Fields(names) => {
            if names.is_empty() {
                return Err(MappingError::EmptyFields);
            }
            let mut fields = Vec::with_capacity(names.len());
            for name in names {
                let field = DeviceField::parse(name)?;
                if fields.contains(&field) {
                    return Err(MappingError::DuplicateField {
                        device_id: request.device_id.clone(),
                        universe: request.universe,
                        fields: field.as_str().to_string(),
                    });
                }
                fields.push(field);
            }
            Ok((MappingKind::Range, fields))
        }
        MappingLayout::Discrete(name) => {
            let field = DeviceField::parse(name)?;
            Ok((MappingKind::Discrete, vec![field]))
        }
    }
}
