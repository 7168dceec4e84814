//! Trigger Resolution
//!
//! For one sprite: find the triggers containing its anchor, map each
//! trigger's type to a registered handler, and call the handlers in priority
//! order until one asks to stop.

use crate::diagnostics::{DiagnosticSink, Severity};
use crate::map::geometry::GeometryOracle;
use crate::map::layers::LayeredMap;
use crate::map::object::{MapObject, ObjectId};
use crate::step::error::StepError;
use crate::step::phase::PhaseKind;
use crate::step::priority::PriorityTable;
use crate::step::registry::TriggerBucket;

/// Handler name for a trigger type: `"mapDoor"` becomes `"triggerMapDoor"`.
///
/// Only the first character is upper-cased. An empty type has no handler.
pub fn handler_name(type_tag: &str) -> Option<String> {
    let mut chars = type_tag.chars();
    let first = chars.next()?;

    let mut name = String::with_capacity(PhaseKind::Trigger.prefix().len() + type_tag.len());
    name.push_str(PhaseKind::Trigger.prefix());
    name.extend(first.to_uppercase());
    name.push_str(chars.as_str());
    Some(name)
}

/// What happened while resolving one sprite's triggers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerOutcome {
    /// Handlers called
    pub invoked: u32,
    /// Triggers skipped for lack of a handler
    pub dropped: u32,
    /// A handler returned `true`
    pub stopped: bool,
}

/// Resolve and run the triggers for one sprite.
///
/// A sprite that is no longer on the sprite layer is skipped. Triggers whose
/// type has no handler are reported at ERROR and left out; the rest still run.
/// Ties in priority keep the oracle's order.
pub fn resolve_triggers<M: LayeredMap>(
    map: &mut M,
    sprite: ObjectId,
    oracle: &dyn GeometryOracle,
    priorities: &PriorityTable,
    handlers: &mut TriggerBucket<M>,
    sink: &dyn DiagnosticSink,
) -> Result<TriggerOutcome, StepError> {
    let mut outcome = TriggerOutcome::default();

    let anchor = match map.sprites().get(sprite) {
        Some(object) => object.anchor,
        None => return Ok(outcome),
    };

    // An object on both layers must not trigger itself
    let found = oracle.find_containing(anchor, map.triggers(), Some(sprite));
    if found.is_empty() {
        return Ok(outcome);
    }

    // Filter into a new list; dropping never skips a neighbour
    let mut candidates: Vec<(i32, String, MapObject)> = Vec::with_capacity(found.len());
    for trigger in found {
        match handler_name(&trigger.type_tag) {
            Some(name) if handlers.contains(&name) => {
                let priority = priorities.resolve(PhaseKind::Trigger, &name);
                candidates.push((priority, name, trigger));
            }
            Some(name) => {
                sink.emit(
                    Severity::Error,
                    &format!(
                        "Map '{}' has no handler named {} for trigger type {}.",
                        map.name(),
                        name,
                        trigger.type_tag
                    ),
                );
                outcome.dropped += 1;
            }
            None => {
                sink.emit(Severity::Error, &StepError::InvalidTriggerType(trigger.id).to_string());
                outcome.dropped += 1;
            }
        }
    }

    candidates.sort_by_key(|(priority, _, _)| *priority);

    for (_, name, trigger) in &candidates {
        let hook = match handlers.get_mut(name) {
            Some(hook) => hook,
            None => continue,
        };

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(handler = %name, trigger = %trigger.id, sprite = %sprite, "trigger");

        let stop = (hook.f)(map, trigger, sprite).map_err(|source| StepError::Hook {
            phase: PhaseKind::Trigger,
            name: name.clone(),
            source,
        })?;
        outcome.invoked += 1;

        if stop {
            outcome.stopped = true;
            break;
        }
    }

    Ok(outcome)
}
