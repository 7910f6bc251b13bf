//! Priority-based DMX source arbitration
//!
//! When multiple sources feed the same universe, the strictly
//! highest-priority source last seen within the timeout window wins
//! (Highest-Takes-Priority, sACN priority model 0-200). A silent source is
//! not dropped immediately: its last frame remains authoritative until the
//! timeout (default 2.5 s per E1.31), so a backup console takes over without
//! a glitch, bounded by the sweep interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::frame::{DmxFrame, SourceKey};

/// Source timeout per the E1.31 specification
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_millis(2500);

/// How long expired source entries are retained before garbage collection
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30);

/// Tuning for the [`PriorityMerger`]
#[derive(Debug, Clone, Copy)]
pub struct MergerConfig {
    /// A source silent for longer than this stops competing for its universe
    pub timeout: Duration,
    /// Expired entries are dropped this long after the timeout
    pub retention: Duration,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SOURCE_TIMEOUT,
            retention: DEFAULT_RETENTION,
        }
    }
}

struct SourceEntry {
    frame: DmxFrame,
    last_seen: Instant,
}

/// Per-universe arbitration state, exclusively owned by the merger.
#[derive(Default)]
struct UniverseState {
    active_source: Option<SourceKey>,
    active_priority: u8,
    last_frame: Option<DmxFrame>,
    last_update_at: Option<Instant>,
    pending: HashMap<SourceKey, SourceEntry>,
}

impl UniverseState {
    /// Winner = strictly highest priority among sources seen within the
    /// timeout window; equal priorities break toward the most recent update.
    fn evaluate_winner(&self, now: Instant, timeout: Duration) -> Option<SourceKey> {
        self.pending
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_seen) <= timeout)
            .max_by(|(_, a), (_, b)| {
                a.frame
                    .priority()
                    .cmp(&b.frame.priority())
                    .then(a.last_seen.cmp(&b.last_seen))
            })
            .map(|(key, _)| key.clone())
    }

    fn collect_garbage(&mut self, now: Instant, timeout: Duration, retention: Duration) {
        let deadline = timeout + retention;
        self.pending
            .retain(|_, entry| now.duration_since(entry.last_seen) <= deadline);
    }
}

/// Per-universe Highest-Takes-Priority merger with timeout failover.
///
/// Operations on one universe are serialized behind that universe's lock;
/// different universes proceed fully in parallel. The periodic
/// [`sweep`](PriorityMerger::sweep) shares the same per-universe locks as
/// [`submit`](PriorityMerger::submit).
pub struct PriorityMerger {
    config: MergerConfig,
    universes: RwLock<HashMap<u16, Arc<Mutex<UniverseState>>>>,
}

impl PriorityMerger {
    /// Create a merger with the given tuning
    pub fn new(config: MergerConfig) -> Self {
        Self {
            config,
            universes: RwLock::new(HashMap::new()),
        }
    }

    fn universe_state(&self, universe: u16) -> Arc<Mutex<UniverseState>> {
        if let Some(state) = self.universes.read().get(&universe) {
            return state.clone();
        }
        self.universes
            .write()
            .entry(universe)
            .or_default()
            .clone()
    }

    /// Record a frame and return the frame to forward downstream, if any.
    ///
    /// Returns the winning frame when the winner changed or the submitting
    /// source is the current winner (the freshest winning data is always
    /// forwarded). Returns `None` when a lower-priority source submits while
    /// a higher-priority source remains active.
    pub fn submit(&self, frame: DmxFrame) -> Option<DmxFrame> {
        let universe = frame.universe();
        let now = frame.received_at();
        let source = frame.source().clone();
        let state_arc = self.universe_state(universe);
        let mut state = state_arc.lock();

        state.pending.insert(
            source.clone(),
            SourceEntry {
                frame,
                last_seen: now,
            },
        );
        state.collect_garbage(now, self.config.timeout, self.config.retention);

        // The submitting source is always fresh, so a winner exists.
        let winner = state.evaluate_winner(now, self.config.timeout)?;
        let winner_frame = state.pending.get(&winner)?.frame.clone();
        let changed = state.active_source.as_ref() != Some(&winner);

        if changed {
            info!(
                universe,
                winner = %winner,
                priority = winner_frame.priority(),
                sources = state.pending.len(),
                "DMX winner changed"
            );
            state.active_source = Some(winner.clone());
        }
        state.active_priority = winner_frame.priority();

        if changed || winner == source {
            state.last_frame = Some(winner_frame.clone());
            state.last_update_at = Some(now);
            Some(winner_frame)
        } else {
            debug!(
                universe,
                source = %source,
                winner = %winner,
                winner_priority = state.active_priority,
                "frame suppressed by higher-priority source"
            );
            None
        }
    }

    /// Expire silent sources and re-evaluate winners.
    ///
    /// Runs on a fixed interval independent of submissions so failover is
    /// detected even with no new traffic. Returns the universes whose winner
    /// changed.
    pub fn sweep(&self, now: Instant) -> Vec<u16> {
        let snapshot: Vec<(u16, Arc<Mutex<UniverseState>>)> = self
            .universes
            .read()
            .iter()
            .map(|(universe, state)| (*universe, state.clone()))
            .collect();

        let mut changed = Vec::new();
        let mut drained = Vec::new();
        for (universe, state_arc) in snapshot {
            let mut state = state_arc.lock();
            state.collect_garbage(now, self.config.timeout, self.config.retention);
            let winner = state.evaluate_winner(now, self.config.timeout);
            if winner != state.active_source {
                match &winner {
                    Some(key) => {
                        let (frame, priority) = match state.pending.get(key) {
                            Some(entry) => (Some(entry.frame.clone()), entry.frame.priority()),
                            None => (None, 0),
                        };
                        info!(
                            universe,
                            previous = state.active_source.as_ref().map(|s| s.to_string()),
                            winner = %key,
                            priority,
                            "DMX source failover"
                        );
                        state.last_frame = frame;
                        state.last_update_at = Some(now);
                        state.active_priority = priority;
                    }
                    None => {
                        info!(universe, "all DMX sources timed out");
                        state.last_frame = None;
                        state.active_priority = 0;
                    }
                }
                state.active_source = winner;
                changed.push(universe);
            }
            if state.pending.is_empty() && state.active_source.is_none() {
                drained.push(universe);
            }
        }

        if !drained.is_empty() {
            let mut map = self.universes.write();
            for universe in drained {
                let empty = map
                    .get(&universe)
                    .map(|state| {
                        let state = state.lock();
                        state.pending.is_empty() && state.active_source.is_none()
                    })
                    .unwrap_or(false);
                if empty {
                    map.remove(&universe);
                }
            }
        }

        changed.sort_unstable();
        changed
    }

    /// Current winning frame for a universe, if any source is active
    pub fn winner(&self, universe: u16) -> Option<DmxFrame> {
        let map = self.universes.read();
        let state = map.get(&universe)?.lock();
        if state.active_source.is_some() {
            state.last_frame.clone()
        } else {
            None
        }
    }

    /// Explicitly reset a universe, dropping all recorded sources
    pub fn clear(&self, universe: u16) {
        if self.universes.write().remove(&universe).is_some() {
            info!(universe, "cleared DMX universe state");
        }
    }

    /// Number of recorded (possibly expired) sources for a universe
    pub fn source_count(&self, universe: u16) -> usize {
        self.universes
            .read()
            .get(&universe)
            .map(|state| state.lock().pending.len())
            .unwrap_or(0)
    }

    /// Universes with any recorded source, sorted
    pub fn active_universes(&self) -> Vec<u16> {
        let mut universes: Vec<u16> = self.universes.read().keys().copied().collect();
        universes.sort_unstable();
        universes
    }
}

impl Default for PriorityMerger {
    fn default() -> Self {
        Self::new(MergerConfig::default())
    }
}
