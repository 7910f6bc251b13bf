//! Per-device debounce and change detection
//!
//! Decoded field values are compared against the effective value (pending if
//! present, last emitted otherwise) and only real changes accumulate. The
//! first change for a device arms a one-shot timer; the timer fires after
//! the quiet window and emits everything accumulated since, so a burst of
//! frames becomes a single outbound update. The timer is not re-armed by
//! further changes, which bounds latency under a continuous DMX stream.
//!
//! A generation counter per device guards against a timer firing after its
//! flush was superseded (explicit flush, prune, shutdown).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::sink::{DeviceUpdate, FieldValue, UpdateSink};

#[derive(Default)]
struct DeviceState {
    pending: BTreeMap<&'static str, FieldValue>,
    last_emitted: BTreeMap<&'static str, FieldValue>,
    generation: u64,
}

impl DeviceState {
    fn take_update(&mut self, device_id: &str) -> Option<DeviceUpdate> {
        if self.pending.is_empty() {
            return None;
        }
        let fields = std::mem::take(&mut self.pending);
        self.last_emitted
            .extend(fields.iter().map(|(name, value)| (*name, *value)));
        Some(DeviceUpdate {
            device_id: device_id.to_string(),
            fields,
        })
    }
}

/// Accumulates per-device field changes and emits them after a quiet window
pub struct Debouncer {
    window: Duration,
    sink: Arc<dyn UpdateSink>,
    devices: Mutex<HashMap<String, DeviceState>>,
}

impl Debouncer {
    /// Create a debouncer emitting into the given sink
    pub fn new(window: Duration, sink: Arc<dyn UpdateSink>) -> Self {
        Self {
            window,
            sink,
            devices: Mutex::new(HashMap::new()),
        }
    }

    /// Record decoded values for a device, arming the flush timer if the
    /// first real change just arrived.
    ///
    /// A value equal to its effective value is dropped; a pending value
    /// changing back to the last emitted one cancels out entirely.
    pub fn offer(
        self: &Arc<Self>,
        device_id: &str,
        values: impl IntoIterator<Item = (&'static str, FieldValue)>,
    ) {
        let mut devices = self.devices.lock();
        let state = devices.entry(device_id.to_string()).or_default();
        let was_idle = state.pending.is_empty();

        for (name, value) in values {
            let effective = state.pending.get(name).or_else(|| state.last_emitted.get(name));
            if effective == Some(&value) {
                continue;
            }
            if state.last_emitted.get(name) == Some(&value) {
                state.pending.remove(name);
            } else {
                state.pending.insert(name, value);
            }
        }

        if was_idle && !state.pending.is_empty() {
            state.generation += 1;
            let generation = state.generation;
            trace!(device_id, generation, "debounce timer armed");
            let debouncer = self.clone();
            let device = device_id.to_string();
            let window = self.window;
            tokio::spawn(async move {
                tokio::time::sleep(window).await;
                debouncer.flush_if_current(&device, generation);
            });
        }
    }

    fn flush_if_current(&self, device_id: &str, generation: u64) {
        let update = {
            let mut devices = self.devices.lock();
            let Some(state) = devices.get_mut(device_id) else {
                return;
            };
            if state.generation != generation {
                return;
            }
            state.take_update(device_id)
        };
        if let Some(update) = update {
            self.sink.emit(update);
        }
    }

    /// Emit every pending update immediately, invalidating armed timers
    pub fn flush_all(&self) {
        let updates: Vec<DeviceUpdate> = {
            let mut devices = self.devices.lock();
            devices
                .iter_mut()
                .filter_map(|(device_id, state)| {
                    state.generation += 1;
                    state.take_update(device_id)
                })
                .collect()
        };
        for update in updates {
            self.sink.emit(update);
        }
    }

    /// Drop tracked state that `keep` rejects, removing drained devices.
    ///
    /// Pruned last-emitted entries mean the next decoded value for that
    /// field counts as a change again.
    pub fn retain(&self, keep: impl Fn(&str, &'static str) -> bool) {
        let mut devices = self.devices.lock();
        devices.retain(|device_id, state| {
            state.generation += 1;
            state.pending.retain(|name, _| keep(device_id, name));
            state.last_emitted.retain(|name, _| keep(device_id, name));
            !(state.pending.is_empty() && state.last_emitted.is_empty())
        });
    }

    /// Number of devices with tracked state
    pub fn tracked_devices(&self) -> usize {
        self.devices.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CaptureSink(Mutex<Vec<DeviceUpdate>>);

    impl UpdateSink for CaptureSink {
        fn emit(&self, update: DeviceUpdate) {
            self.0.lock().push(update);
        }
    }

    fn debouncer() -> (Arc<Debouncer>, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::default());
        let debouncer = Arc::new(Debouncer::new(
            Duration::from_millis(50),
            sink.clone() as Arc<dyn UpdateSink>,
        ));
        (debouncer, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_coalesces_into_one_update_with_final_values() {
        let (debouncer, sink) = debouncer();

        for value in [10u16, 20, 30, 40, 250] {
            debouncer.offer("lamp", [("r", FieldValue::Int(value))]);
        }
        tokio::time::sleep(Duration::from_millis(60)).await;

        let updates = sink.0.lock();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].device_id, "lamp");
        assert_eq!(updates[0].fields["r"], FieldValue::Int(250));
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_values_emit_nothing() {
        let (debouncer, sink) = debouncer();

        debouncer.offer("lamp", [("r", FieldValue::Int(100))]);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.0.lock().len(), 1);

        // The same value again, twice, after the flush.
        debouncer.offer("lamp", [("r", FieldValue::Int(100))]);
        debouncer.offer("lamp", [("r", FieldValue::Int(100))]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn bounce_back_within_the_window_cancels_out() {
        let (debouncer, sink) = debouncer();

        debouncer.offer("lamp", [("power", FieldValue::Bool(true))]);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.0.lock().len(), 1);

        // Off then back on within one window: no net change.
        debouncer.offer("lamp", [("power", FieldValue::Bool(false))]);
        debouncer.offer("lamp", [("power", FieldValue::Bool(true))]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn devices_flush_independently() {
        let (debouncer, sink) = debouncer();

        debouncer.offer("lamp", [("r", FieldValue::Int(1))]);
        debouncer.offer("strip", [("g", FieldValue::Int(2))]);
        tokio::time::sleep(Duration::from_millis(60)).await;

        let updates = sink.0.lock();
        assert_eq!(updates.len(), 2);
        let mut ids: Vec<&str> = updates.iter().map(|u| u.device_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, ["lamp", "strip"]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_all_emits_early_and_cancels_the_timer() {
        let (debouncer, sink) = debouncer();

        debouncer.offer("lamp", [("r", FieldValue::Int(5))]);
        debouncer.flush_all();
        assert_eq!(sink.0.lock().len(), 1);

        // The armed timer fires later but its generation is stale.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retain_drops_state_and_resets_change_detection() {
        let (debouncer, sink) = debouncer();

        debouncer.offer("lamp", [("r", FieldValue::Int(9))]);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.0.lock().len(), 1);
        assert_eq!(debouncer.tracked_devices(), 1);

        debouncer.retain(|_, _| false);
        assert_eq!(debouncer.tracked_devices(), 0);

        // Previously emitted value counts as a change again.
        debouncer.offer("lamp", [("r", FieldValue::Int(9))]);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.0.lock().len(), 2);
    }
}
