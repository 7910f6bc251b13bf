//! Frame processing orchestration
//!
//! [`MappingService`] is the bridge core: input decoders submit frames, the
//! priority merger arbitrates per universe, winning frames are matched
//! against the compiled mapping table, and decoded field changes flow into
//! the per-device debounce. A periodic sweep expires silent sources so a
//! backup console takes over even when no new traffic arrives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use dmxflow_core::{DmxFrame, MergerConfig, PriorityMerger};
use dmxflow_map::{
    CapabilityLookup, CompiledTables, DeviceField, TableHandle, DEFAULT_COLOR_TEMP_RANGE,
};

use crate::config::ServiceConfig;
use crate::debounce::Debouncer;
use crate::decode;
use crate::sink::{FieldValue, UpdateSink};

/// Orchestrates merge, table lookup, decode, and debounced emission
pub struct MappingService {
    config: ServiceConfig,
    merger: PriorityMerger,
    tables: TableHandle,
    capabilities: Arc<dyn CapabilityLookup>,
    debouncer: Arc<Debouncer>,
    seen_generation: AtomicU64,
}

impl MappingService {
    /// Create a service reading the given compiled table handle and
    /// emitting into `sink`.
    pub fn new(
        config: ServiceConfig,
        tables: TableHandle,
        capabilities: Arc<dyn CapabilityLookup>,
        sink: Arc<dyn UpdateSink>,
    ) -> Self {
        let merger = PriorityMerger::new(MergerConfig {
            timeout: config.source_timeout(),
            ..MergerConfig::default()
        });
        let debouncer = Arc::new(Debouncer::new(config.debounce(), sink));
        Self {
            config,
            merger,
            tables,
            capabilities,
            debouncer,
            seen_generation: AtomicU64::new(0),
        }
    }

    /// The service's tuning
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The underlying merger, for status inspection
    pub fn merger(&self) -> &PriorityMerger {
        &self.merger
    }

    /// Submit one decoded frame from an input listener.
    ///
    /// The frame either wins its universe and is processed immediately, or
    /// is suppressed by a higher-priority source and recorded for failover.
    pub fn submit_frame(&self, frame: DmxFrame) {
        if let Some(winner) = self.merger.submit(frame) {
            self.process(&winner);
        }
    }

    /// Expire silent sources and re-process universes whose winner changed
    pub fn sweep(&self, now: Instant) {
        for universe in self.merger.sweep(now) {
            // A universe with no surviving source keeps its last device
            // state; there is nothing to emit.
            if let Some(frame) = self.merger.winner(universe) {
                self.process(&frame);
            }
        }
    }

    /// Drive [`sweep`](Self::sweep) on the configured interval until the
    /// task is dropped.
    pub async fn run_sweeper(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.sweep_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_ms = self.config.sweep_interval_ms,
            timeout_ms = self.config.source_timeout_ms,
            "DMX source sweep running"
        );
        loop {
            interval.tick().await;
            self.sweep(Instant::now());
        }
    }

    /// Flush or drop pending updates ahead of shutdown
    pub fn shutdown(&self) {
        if self.config.flush_on_shutdown {
            self.debouncer.flush_all();
        }
        info!("mapping service shut down");
    }

    fn process(&self, frame: &DmxFrame) {
        let tables = self.tables.load();
        self.sync_tables(&tables);
        let Some(table) = tables.universe(frame.universe()) else {
            return;
        };

        let mut current_device: Option<(&str, Vec<(&'static str, FieldValue)>)> = None;
        for (channel, slot) in table.entries() {
            let kelvin_range = match slot.field {
                DeviceField::ColorTemp => self
                    .capabilities
                    .capabilities(&slot.device_id)
                    .map(|caps| caps.kelvin_range())
                    .unwrap_or(DEFAULT_COLOR_TEMP_RANGE),
                _ => DEFAULT_COLOR_TEMP_RANGE,
            };
            let values = decode::decode_field(slot.field, frame.channel(channel), kelvin_range);

            // Entries are channel-ordered, so a device's slots arrive in
            // runs; offer once per run.
            match &mut current_device {
                Some((device_id, batch)) if *device_id == slot.device_id.as_ref() => {
                    batch.extend(values);
                }
                _ => {
                    if let Some((device_id, batch)) = current_device.take() {
                        self.debouncer.offer(device_id, batch);
                    }
                    current_device = Some((slot.device_id.as_ref(), values));
                }
            }
        }
        if let Some((device_id, batch)) = current_device {
            self.debouncer.offer(device_id, batch);
        }
    }

    /// Notice table swaps and drop debounce state for unmapped fields, so
    /// re-created mappings start from a clean change-detection slate.
    fn sync_tables(&self, tables: &CompiledTables) {
        let generation = tables.generation();
        if self.seen_generation.swap(generation, Ordering::AcqRel) == generation {
            return;
        }
        self.debouncer.retain(|device_id, name| {
            DeviceField::ALL.iter().any(|field| {
                decode::output_names(*field).contains(&name) && tables.is_mapped(device_id, *field)
            })
        });
        debug!(generation, "compiled mapping table reloaded");
    }
}
