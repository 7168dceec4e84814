//! Hook Registry
//!
//! Mechanics register named hooks here while a map is being built. Each name
//! is classified into a phase by its prefix and checked against the
//! registration method's calling convention.
//!
//! `discover` turns the registry into sorted buckets:
//!
//! 1. declarative priority overrides are applied
//! 2. `init*` hooks run once, in name order
//! 3. every hook gets a priority entry (phase default if none was set)
//! 4. each bucket is sorted by `(priority, name)`
//! 5. the priority table is frozen

use std::collections::{BTreeMap, BTreeSet};

use crate::config::PriorityOverride;
use crate::diagnostics::{DiagnosticSink, Severity};
use crate::map::object::{MapObject, ObjectId};
use crate::step::error::{RegistryError, StepError};
use crate::step::phase::{HookShape, PhaseKind};
use crate::step::priority::PriorityTable;
use crate::step::trigger::handler_name;

/// Construction hook: `init<Mechanic>(ctx)`.
pub type InitFn<M> = Box<dyn FnMut(&mut InitContext<'_, M>) -> anyhow::Result<()> + Send>;

/// Map hook: `stepMapStart<Mechanic>(map)` / `stepMapEnd<Mechanic>(map)`.
pub type MapFn<M> = Box<dyn FnMut(&mut M) -> anyhow::Result<()> + Send>;

/// Sprite hook: `stepSpriteStart` / `stepMove` / `stepSpriteEnd` `<Mechanic>(map, sprite)`.
pub type SpriteFn<M> = Box<dyn FnMut(&mut M, ObjectId) -> anyhow::Result<()> + Send>;

/// Trigger handler: `trigger<Type>(map, trigger, sprite)`. Returning `true`
/// stops further triggers for that sprite this tick.
pub type TriggerFn<M> = Box<dyn FnMut(&mut M, &MapObject, ObjectId) -> anyhow::Result<bool> + Send>;

/// A named hook with its resolved priority.
pub struct Hook<F> {
    /// Hook name, e.g. `stepMoveWalk`
    pub name: String,
    /// Priority it was sorted by
    pub priority: i32,
    pub(crate) f: F,
}

impl<F> Hook<F> {
    fn new(name: String, f: F) -> Self {
        Self { name, priority: 0, f }
    }
}

/// An independently authored game mechanic.
///
/// Mechanics never see each other; they meet only through hook names and
/// priorities.
pub trait Mechanic<M> {
    /// Mechanic name, shown in inventory reports.
    fn name(&self) -> &str;

    /// Register this mechanic's hooks.
    fn register(&self, hooks: &mut HookRegistry<M>);
}

/// Access given to `init*` hooks.
pub struct InitContext<'a, M> {
    map: &'a mut M,
    priorities: &'a mut PriorityTable,
    sink: &'a dyn DiagnosticSink,
}

impl<'a, M> InitContext<'a, M> {
    /// Map state.
    pub fn map(&mut self) -> &mut M {
        self.map
    }

    /// Set a hook priority before buckets are sorted.
    ///
    /// `Init` is not a valid target; the call is reported and ignored.
    pub fn set_priority(&mut self, phase: PhaseKind, name: &str, priority: i32) {
        let result = self.priorities.set(phase, name, priority);
        report_priority_result(self.sink, result);
    }

    /// Set a hook priority by phase tag (`"stepMove"` or `"Move"`).
    pub fn set_priority_tag(&mut self, tag: &str, name: &str, priority: i32) {
        let result = self.priorities.set_by_tag(tag, name, priority);
        report_priority_result(self.sink, result);
    }

    /// Current priority a hook would sort by.
    pub fn priority(&self, phase: PhaseKind, name: &str) -> i32 {
        self.priorities.resolve(phase, name)
    }

    /// Emit a diagnostic.
    pub fn report(&self, severity: Severity, message: &str) {
        self.sink.emit(severity, message);
    }
}

/// Report a rejected priority change as a warning. Never fatal.
pub(crate) fn report_priority_result(sink: &dyn DiagnosticSink, result: Result<(), StepError>) {
    if let Err(err) = result {
        sink.emit(Severity::Warning, &err.to_string());
    }
}

/// Hooks registered for one map, before sorting.
pub struct HookRegistry<M> {
    init: Vec<Hook<InitFn<M>>>,
    map_hooks: BTreeMap<PhaseKind, Vec<Hook<MapFn<M>>>>,
    sprite_hooks: BTreeMap<PhaseKind, Vec<Hook<SpriteFn<M>>>>,
    triggers: Vec<Hook<TriggerFn<M>>>,
    overrides: Vec<PriorityOverride>,
    mechanics: Vec<String>,
    names: BTreeSet<String>,
    errors: Vec<RegistryError>,
}

impl<M> Default for HookRegistry<M> {
    fn default() -> Self {
        Self {
            init: Vec::new(),
            map_hooks: BTreeMap::new(),
            sprite_hooks: BTreeMap::new(),
            triggers: Vec::new(),
            overrides: Vec::new(),
            mechanics: Vec::new(),
            names: BTreeSet::new(),
            errors: Vec::new(),
        }
    }
}

impl<M: 'static> HookRegistry<M> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every hook of a mechanic.
    pub fn mechanic(&mut self, mechanic: &dyn Mechanic<M>) -> &mut Self {
        self.mechanics.push(mechanic.name().to_string());
        mechanic.register(self);
        self
    }

    /// Register an `init*` hook.
    pub fn init<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: FnMut(&mut InitContext<'_, M>) -> anyhow::Result<()> + Send + 'static,
    {
        if self.admit(name, HookShape::Init, "an init hook").is_some() {
            self.init.push(Hook::new(name.to_string(), Box::new(f)));
        }
        self
    }

    /// Register a `stepMapStart*` or `stepMapEnd*` hook.
    pub fn map_hook<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: FnMut(&mut M) -> anyhow::Result<()> + Send + 'static,
    {
        if let Some(phase) = self.admit(name, HookShape::Map, "a map hook") {
            self.map_hooks
                .entry(phase)
                .or_default()
                .push(Hook::new(name.to_string(), Box::new(f)));
        }
        self
    }

    /// Register a `stepSpriteStart*`, `stepMove*`, or `stepSpriteEnd*` hook.
    pub fn sprite_hook<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: FnMut(&mut M, ObjectId) -> anyhow::Result<()> + Send + 'static,
    {
        if let Some(phase) = self.admit(name, HookShape::Sprite, "a sprite hook") {
            self.sprite_hooks
                .entry(phase)
                .or_default()
                .push(Hook::new(name.to_string(), Box::new(f)));
        }
        self
    }

    /// Register the handler for a trigger type tag.
    ///
    /// Type `"mapDoor"` is stored as `triggerMapDoor`.
    pub fn trigger<F>(&mut self, type_tag: &str, f: F) -> &mut Self
    where
        F: FnMut(&mut M, &MapObject, ObjectId) -> anyhow::Result<bool> + Send + 'static,
    {
        match handler_name(type_tag) {
            Some(name) => self.trigger_hook(&name, f),
            None => {
                self.errors.push(RegistryError::EmptyTriggerType);
                self
            }
        }
    }

    /// Register a trigger handler under an explicit `trigger*` name.
    pub fn trigger_hook<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: FnMut(&mut M, &MapObject, ObjectId) -> anyhow::Result<bool> + Send + 'static,
    {
        if self.admit(name, HookShape::Trigger, "a trigger handler").is_some() {
            self.triggers.push(Hook::new(name.to_string(), Box::new(f)));
        }
        self
    }

    /// Declare a priority override, applied before any `init*` hook runs.
    pub fn priority(&mut self, phase: PhaseKind, name: &str, priority: i32) -> &mut Self {
        self.overrides.push(PriorityOverride::new(phase.prefix(), name, priority));
        self
    }

    /// Names of registered mechanics, in registration order.
    pub fn mechanic_names(&self) -> &[String] {
        &self.mechanics
    }

    /// Classify a name and check it fits the registration method.
    /// Records an error and returns `None` when it does not.
    fn admit(&mut self, name: &str, shape: HookShape, expected: &'static str) -> Option<PhaseKind> {
        let phase = match PhaseKind::classify(name) {
            Some(phase) => phase,
            None => {
                self.errors.push(RegistryError::Unclassified(name.to_string()));
                return None;
            }
        };

        if phase.shape() != shape {
            self.errors.push(RegistryError::WrongPhase {
                name: name.to_string(),
                found: phase,
                expected,
            });
            return None;
        }

        if !self.names.insert(name.to_string()) {
            self.errors.push(RegistryError::Duplicate(name.to_string()));
            return None;
        }

        Some(phase)
    }

    /// Run init hooks and sort every bucket. Runs once per map.
    pub(crate) fn discover(
        self,
        map: &mut M,
        priorities: &mut PriorityTable,
        sink: &dyn DiagnosticSink,
    ) -> Result<Buckets<M>, StepError> {
        let HookRegistry {
            mut init,
            mut map_hooks,
            mut sprite_hooks,
            triggers,
            overrides,
            mechanics,
            errors,
            ..
        } = self;

        // First error fails the build; the rest are still reported
        let mut errors = errors.into_iter();
        if let Some(first) = errors.next() {
            for err in errors {
                sink.emit(Severity::Error, &err.to_string());
            }
            return Err(first.into());
        }

        for entry in &overrides {
            report_priority_result(sink, priorities.set_by_tag(&entry.phase, &entry.hook, entry.priority));
        }

        init.sort_by(|a, b| a.name.cmp(&b.name));
        for hook in init.iter_mut() {
            let mut ctx = InitContext { map: &mut *map, priorities: &mut *priorities, sink };
            (hook.f)(&mut ctx).map_err(|source| StepError::Hook {
                phase: PhaseKind::Init,
                name: hook.name.clone(),
                source,
            })?;
        }

        let buckets = Buckets {
            map_start: sort_bucket(map_hooks.remove(&PhaseKind::MapStart).unwrap_or_default(), PhaseKind::MapStart, priorities),
            sprite_start: sort_bucket(sprite_hooks.remove(&PhaseKind::SpriteStart).unwrap_or_default(), PhaseKind::SpriteStart, priorities),
            trigger: TriggerBucket::new(sort_bucket(triggers, PhaseKind::Trigger, priorities)),
            move_: sort_bucket(sprite_hooks.remove(&PhaseKind::Move).unwrap_or_default(), PhaseKind::Move, priorities),
            sprite_end: sort_bucket(sprite_hooks.remove(&PhaseKind::SpriteEnd).unwrap_or_default(), PhaseKind::SpriteEnd, priorities),
            map_end: sort_bucket(map_hooks.remove(&PhaseKind::MapEnd).unwrap_or_default(), PhaseKind::MapEnd, priorities),
            init_names: init.into_iter().map(|hook| hook.name).collect(),
            mechanics,
        };

        priorities.freeze();
        Ok(buckets)
    }
}

/// Give every hook a priority entry, then sort by `(priority, name)`.
fn sort_bucket<F>(mut hooks: Vec<Hook<F>>, phase: PhaseKind, priorities: &mut PriorityTable) -> Vec<Hook<F>> {
    for hook in hooks.iter_mut() {
        priorities.ensure(phase, &hook.name);
        hook.priority = priorities.resolve(phase, &hook.name);
    }
    hooks.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
    hooks
}

/// Trigger handlers in priority order, with lookup by handler name.
pub struct TriggerBucket<M> {
    hooks: Vec<Hook<TriggerFn<M>>>,
    index: BTreeMap<String, usize>,
}

impl<M> TriggerBucket<M> {
    fn new(hooks: Vec<Hook<TriggerFn<M>>>) -> Self {
        let index = hooks
            .iter()
            .enumerate()
            .map(|(i, hook)| (hook.name.clone(), i))
            .collect();
        Self { hooks, index }
    }

    /// Is there a handler with this name?
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Sorted handlers.
    pub fn hooks(&self) -> &[Hook<TriggerFn<M>>] {
        &self.hooks
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Hook<TriggerFn<M>>> {
        let i = *self.index.get(name)?;
        self.hooks.get_mut(i)
    }
}

/// Sorted hooks for every phase. Fixed for the lifetime of a map.
pub struct Buckets<M> {
    pub(crate) map_start: Vec<Hook<MapFn<M>>>,
    pub(crate) sprite_start: Vec<Hook<SpriteFn<M>>>,
    pub(crate) trigger: TriggerBucket<M>,
    pub(crate) move_: Vec<Hook<SpriteFn<M>>>,
    pub(crate) sprite_end: Vec<Hook<SpriteFn<M>>>,
    pub(crate) map_end: Vec<Hook<MapFn<M>>>,
    pub(crate) init_names: Vec<String>,
    pub(crate) mechanics: Vec<String>,
}

impl<M> Buckets<M> {
    /// `(name, priority)` pairs of a phase, in execution order.
    /// `Init` lists init hooks in the order they ran, with priority 0.
    pub fn order(&self, phase: PhaseKind) -> Vec<(&str, i32)> {
        fn pairs<F>(hooks: &[Hook<F>]) -> Vec<(&str, i32)> {
            hooks.iter().map(|h| (h.name.as_str(), h.priority)).collect()
        }

        match phase {
            PhaseKind::Init => self.init_names.iter().map(|n| (n.as_str(), 0)).collect(),
            PhaseKind::MapStart => pairs(&self.map_start),
            PhaseKind::SpriteStart => pairs(&self.sprite_start),
            PhaseKind::Trigger => pairs(self.trigger.hooks()),
            PhaseKind::Move => pairs(&self.move_),
            PhaseKind::SpriteEnd => pairs(&self.sprite_end),
            PhaseKind::MapEnd => pairs(&self.map_end),
        }
    }

    /// Names of the init hooks, in the order they ran.
    pub fn init_names(&self) -> &[String] {
        &self.init_names
    }

    /// Registered mechanic names.
    pub fn mechanics(&self) -> &[String] {
        &self.mechanics
    }
}
