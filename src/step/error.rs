//! Step Errors

use crate::map::object::ObjectId;
use crate::step::phase::PhaseKind;

/// Problems found while registering hooks. Returned from map construction.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Name does not start with any hook prefix (or is a bare prefix).
    #[error("hook name {0:?} does not match any phase prefix")]
    Unclassified(String),

    /// Name classifies into a phase the registration method cannot serve.
    #[error("hook {name:?} is a {found} hook, expected {expected}")]
    WrongPhase {
        /// Hook name
        name: String,
        /// Kind its prefix selects
        found: PhaseKind,
        /// What the registration method accepts
        expected: &'static str,
    },

    /// Same name registered twice.
    #[error("hook {0:?} registered twice")]
    Duplicate(String),

    /// Trigger handlers need a non-empty type tag.
    #[error("trigger type tag must not be empty")]
    EmptyTriggerType,
}

/// Errors surfaced by a map's dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// A hook failed. The rest of the tick is abandoned.
    #[error("{phase} hook {name} failed: {source}")]
    Hook {
        /// Phase the hook ran in
        phase: PhaseKind,
        /// Hook name
        name: String,
        /// Error the hook returned
        #[source]
        source: anyhow::Error,
    },

    /// Trigger object with an empty type tag.
    #[error("trigger {0} has an empty type")]
    InvalidTriggerType(ObjectId),

    /// Priority targeted a phase that has no bucket.
    #[error("{0} is not a valid step phase")]
    InvalidPhase(String),

    /// Priority change after the buckets were sorted.
    #[error("priorities are fixed once hooks are sorted; {0} unchanged")]
    PrioritiesFrozen(String),

    /// Registration failed while building the map.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
