//! Hook Priorities
//!
//! Per-phase mapping from hook name to an integer priority. Lower runs first.
//! Each tick phase has its own default and its own overrides; an override in
//! one phase never leaks into another.

use std::collections::BTreeMap;

use crate::step::error::StepError;
use crate::step::phase::{PhaseKind, TICK_PHASES};

/// Priority given to any hook without an override.
pub const DEFAULT_PRIORITY: i32 = 50;

/// Priorities for one tick phase.
#[derive(Clone, Debug, PartialEq, Eq)]
struct PhasePriorities {
    default: i32,
    entries: BTreeMap<String, i32>,
}

impl PhasePriorities {
    fn new() -> Self {
        Self {
            default: DEFAULT_PRIORITY,
            entries: BTreeMap::new(),
        }
    }
}

/// Priority table for the six tick phases.
///
/// Mutable while a map is being built; frozen once buckets are sorted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriorityTable {
    phases: BTreeMap<PhaseKind, PhasePriorities>,
    frozen: bool,
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityTable {
    /// Create a table with the default entry installed for every tick phase.
    pub fn new() -> Self {
        let phases = TICK_PHASES
            .iter()
            .map(|phase| (*phase, PhasePriorities::new()))
            .collect();

        Self { phases, frozen: false }
    }

    /// Set a hook's priority.
    ///
    /// Fails with `InvalidPhase` for `Init`, which has no bucket, and with
    /// `PrioritiesFrozen` once buckets have been sorted.
    pub fn set(&mut self, phase: PhaseKind, name: &str, priority: i32) -> Result<(), StepError> {
        if self.frozen {
            return Err(StepError::PrioritiesFrozen(name.to_string()));
        }
        let entry = self
            .phases
            .get_mut(&phase)
            .ok_or_else(|| StepError::InvalidPhase(phase.to_string()))?;
        entry.entries.insert(name.to_string(), priority);
        Ok(())
    }

    /// Set a hook's priority by phase tag (`"stepMove"` or `"Move"`).
    pub fn set_by_tag(&mut self, tag: &str, name: &str, priority: i32) -> Result<(), StepError> {
        match PhaseKind::from_tag(tag) {
            Some(phase) if phase.is_tick_phase() => self.set(phase, name, priority),
            _ => Err(StepError::InvalidPhase(tag.to_string())),
        }
    }

    /// Explicit priority for a hook, if one was set.
    pub fn get(&self, phase: PhaseKind, name: &str) -> Option<i32> {
        self.phases.get(&phase)?.entries.get(name).copied()
    }

    /// Does the phase have an entry for this name?
    pub fn contains(&self, phase: PhaseKind, name: &str) -> bool {
        self.get(phase, name).is_some()
    }

    /// Priority a hook will sort by: its entry, or the phase default.
    pub fn resolve(&self, phase: PhaseKind, name: &str) -> i32 {
        self.get(phase, name).unwrap_or_else(|| self.default_for(phase))
    }

    /// Default priority of a phase.
    pub fn default_for(&self, phase: PhaseKind) -> i32 {
        self.phases
            .get(&phase)
            .map(|p| p.default)
            .unwrap_or(DEFAULT_PRIORITY)
    }

    /// Insert the phase default for a name that has no entry yet.
    pub fn ensure(&mut self, phase: PhaseKind, name: &str) {
        if let Some(entry) = self.phases.get_mut(&phase) {
            let default = entry.default;
            entry.entries.entry(name.to_string()).or_insert(default);
        }
    }

    /// Entries of a phase in name order.
    pub fn entries(&self, phase: PhaseKind) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.phases
            .get(&phase)
            .into_iter()
            .flat_map(|p| p.entries.iter().map(|(name, priority)| (name.as_str(), *priority)))
    }

    /// Stop accepting changes. Bucket order is fixed from here on.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Has the table been frozen?
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
