//! Step Map Executor
//!
//! Owns a map's state and its sorted hook buckets, and advances the map one
//! tick at a time.
//!
//! ## Tick Order
//!
//! ```text
//! 1. stepMapStart*()      each hook once
//! 2. stepSpriteStart*(s)  for each hook: for each sprite
//! 3. trigger*(t, s)       for each sprite: resolve triggers
//! 4. stepMove*(s)         for each hook: for each sprite
//! 5. stepSpriteEnd*(s)    for each hook: for each sprite
//! 6. stepMapEnd*()        each hook once
//! ```
//!
//! Sprite phases loop hook-outer, sprite-inner: a higher-priority hook has
//! touched every sprite before the next hook starts. The sprite list is
//! captured once at the start of each phase; sprites added or removed by a
//! hook show up in the next phase.

use serde::Serialize;
use tracing::debug_span;

use crate::config::StepMapConfig;
use crate::core::hash::{ScheduleHash, ScheduleHasher};
use crate::diagnostics::{DiagnosticSink, Severity, TracingSink};
use crate::map::geometry::{GeometryOracle, ShapeOracle};
use crate::map::layers::LayeredMap;
use crate::map::object::{MapObject, ObjectId};
use crate::step::error::StepError;
use crate::step::phase::{PhaseKind, TICK_PHASES};
use crate::step::priority::PriorityTable;
use crate::step::registry::{
    report_priority_result, Buckets, Hook, HookRegistry, InitContext, MapFn, Mechanic, SpriteFn,
};
use crate::step::report::{self, Inventory};
use crate::step::trigger::resolve_triggers;

/// Result of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickResult {
    /// Tick number (first tick is 1)
    pub tick: u64,
    /// Map and sprite hook invocations
    pub hooks_run: u32,
    /// Trigger handler invocations
    pub triggers_fired: u32,
    /// Triggers skipped for lack of a handler
    pub triggers_dropped: u32,
    /// Sprites whose trigger resolution was stopped by a handler
    pub sprites_stopped: u32,
}

/// Builder for a `StepMap`.
///
/// Collects mechanics, hooks, and priority overrides, then runs the init
/// pass and sorts buckets in `build`.
pub struct StepMapBuilder<M> {
    map: M,
    registry: HookRegistry<M>,
    config: StepMapConfig,
    oracle: Option<Box<dyn GeometryOracle + Send>>,
    sink: Option<Box<dyn DiagnosticSink + Send>>,
}

impl<M: LayeredMap + 'static> StepMapBuilder<M> {
    /// Start building around loaded map state.
    pub fn new(map: M) -> Self {
        Self {
            map,
            registry: HookRegistry::new(),
            config: StepMapConfig::default(),
            oracle: None,
            sink: None,
        }
    }

    /// Use this configuration.
    pub fn config(mut self, config: StepMapConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this containment oracle instead of `ShapeOracle`.
    pub fn oracle(mut self, oracle: impl GeometryOracle + Send + 'static) -> Self {
        self.oracle = Some(Box::new(oracle));
        self
    }

    /// Send diagnostics here instead of `tracing`.
    pub fn sink(mut self, sink: impl DiagnosticSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Register a mechanic's hooks.
    pub fn mechanic(mut self, mechanic: impl Mechanic<M>) -> Self {
        self.registry.mechanic(&mechanic);
        self
    }

    /// Register an `init*` hook.
    pub fn init<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnMut(&mut InitContext<'_, M>) -> anyhow::Result<()> + Send + 'static,
    {
        self.registry.init(name, f);
        self
    }

    /// Register a `stepMapStart*` / `stepMapEnd*` hook.
    pub fn map_hook<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnMut(&mut M) -> anyhow::Result<()> + Send + 'static,
    {
        self.registry.map_hook(name, f);
        self
    }

    /// Register a `stepSpriteStart*` / `stepMove*` / `stepSpriteEnd*` hook.
    pub fn sprite_hook<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnMut(&mut M, ObjectId) -> anyhow::Result<()> + Send + 'static,
    {
        self.registry.sprite_hook(name, f);
        self
    }

    /// Register the handler for a trigger type tag.
    pub fn trigger<F>(mut self, type_tag: &str, f: F) -> Self
    where
        F: FnMut(&mut M, &MapObject, ObjectId) -> anyhow::Result<bool> + Send + 'static,
    {
        self.registry.trigger(type_tag, f);
        self
    }

    /// Register a trigger handler under an explicit `trigger*` name.
    pub fn trigger_hook<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnMut(&mut M, &MapObject, ObjectId) -> anyhow::Result<bool> + Send + 'static,
    {
        self.registry.trigger_hook(name, f);
        self
    }

    /// Declare a priority override.
    pub fn priority(mut self, phase: PhaseKind, name: &str, priority: i32) -> Self {
        self.registry.priority(phase, name, priority);
        self
    }

    /// Run the init pass, sort the buckets, and return a ready map.
    ///
    /// Priority order of application: configuration overrides, then
    /// registered overrides, then `init*` hooks in name order.
    pub fn build(self) -> Result<StepMap<M>, StepError> {
        let StepMapBuilder { mut map, registry, config, oracle, sink } = self;

        let sink: Box<dyn DiagnosticSink + Send> = match sink {
            Some(sink) => sink,
            None => Box::new(TracingSink::new(map.name())),
        };
        let oracle: Box<dyn GeometryOracle + Send> = match oracle {
            Some(oracle) => oracle,
            None => Box::new(ShapeOracle),
        };

        let mut priorities = PriorityTable::new();
        for entry in &config.priority_overrides {
            report_priority_result(
                sink.as_ref(),
                priorities.set_by_tag(&entry.phase, &entry.hook, entry.priority),
            );
        }

        let buckets = registry.discover(&mut map, &mut priorities, sink.as_ref())?;

        let step_map = StepMap {
            map,
            buckets,
            priorities,
            oracle,
            sink,
            tick: 0,
        };

        if config.log_inventory {
            step_map.sink.emit(
                Severity::Verbose,
                &format!("Map '{}' Hooks:\n{}", step_map.map.name(), step_map.diagnostics_report()),
            );
        }

        Ok(step_map)
    }
}

/// A loaded map with its hook schedule.
pub struct StepMap<M> {
    map: M,
    buckets: Buckets<M>,
    priorities: PriorityTable,
    oracle: Box<dyn GeometryOracle + Send>,
    sink: Box<dyn DiagnosticSink + Send>,
    tick: u64,
}

impl<M: LayeredMap + 'static> StepMap<M> {
    /// Start building a step map.
    pub fn builder(map: M) -> StepMapBuilder<M> {
        StepMapBuilder::new(map)
    }

    /// Move the map forward one tick.
    ///
    /// The first failing hook ends the tick; phases already run are not
    /// undone.
    pub fn tick(&mut self) -> Result<TickResult, StepError> {
        self.tick += 1;
        let span = debug_span!("tick", map = %self.map.name(), tick = self.tick);
        let _enter = span.enter();

        let mut result = TickResult {
            tick: self.tick,
            ..Default::default()
        };

        // 1. Map start
        run_map_hooks(&mut self.buckets.map_start, PhaseKind::MapStart, &mut self.map, &mut result)?;

        // 2. Sprite start
        run_sprite_hooks(&mut self.buckets.sprite_start, PhaseKind::SpriteStart, &mut self.map, &mut result)?;

        // 3. Triggers, one resolution per sprite
        let sprites = self.map.sprites().ids();
        for sprite in sprites {
            let outcome = resolve_triggers(
                &mut self.map,
                sprite,
                self.oracle.as_ref(),
                &self.priorities,
                &mut self.buckets.trigger,
                self.sink.as_ref(),
            )?;
            result.triggers_fired += outcome.invoked;
            result.triggers_dropped += outcome.dropped;
            if outcome.stopped {
                result.sprites_stopped += 1;
            }
        }

        // 4. Move
        run_sprite_hooks(&mut self.buckets.move_, PhaseKind::Move, &mut self.map, &mut result)?;

        // 5. Sprite end
        run_sprite_hooks(&mut self.buckets.sprite_end, PhaseKind::SpriteEnd, &mut self.map, &mut result)?;

        // 6. Map end
        run_map_hooks(&mut self.buckets.map_end, PhaseKind::MapEnd, &mut self.map, &mut result)?;

        Ok(result)
    }

    /// Change a hook priority after construction.
    ///
    /// Buckets are sorted once per map, so this is always rejected with a
    /// warning. Set priorities from config, the builder, or an `init*` hook.
    pub fn set_priority(&mut self, phase: PhaseKind, name: &str, priority: i32) {
        let result = self.priorities.set(phase, name, priority);
        report_priority_result(self.sink.as_ref(), result);
    }

    /// Inventory report of every hook and its priority.
    pub fn diagnostics_report(&self) -> String {
        let phases: Vec<(PhaseKind, Vec<(&str, i32)>)> = TICK_PHASES
            .iter()
            .map(|phase| (*phase, self.buckets.order(*phase)))
            .collect();

        let mut unmatched = Vec::new();
        for (phase, hooks) in &phases {
            for (name, priority) in self.priorities.entries(*phase) {
                if !hooks.iter().any(|(hook, _)| *hook == name) {
                    unmatched.push((*phase, name, priority));
                }
            }
        }

        let members = self
            .buckets
            .init_names()
            .iter()
            .chain(self.buckets.mechanics())
            .map(String::as_str)
            .collect();

        report::render(&Inventory { phases, members, unmatched })
    }

    /// Digest of every bucket's order and priorities.
    ///
    /// Equal for two maps built from the same registrations; never changed
    /// by ticking.
    pub fn schedule_digest(&self) -> ScheduleHash {
        let mut hasher = ScheduleHasher::for_buckets();
        for phase in TICK_PHASES {
            let order = self.buckets.order(phase);
            hasher.update_u8(phase as u8);
            hasher.update_u32(order.len() as u32);
            for (name, priority) in order {
                hasher.update_str(name);
                hasher.update_i32(priority);
            }
        }
        hasher.finalize()
    }

    /// Hooks of a phase as `(name, priority)`, in execution order.
    pub fn hook_order(&self, phase: PhaseKind) -> Vec<(&str, i32)> {
        self.buckets.order(phase)
    }

    /// Resolved priority of a hook.
    pub fn priority(&self, phase: PhaseKind, name: &str) -> i32 {
        self.priorities.resolve(phase, name)
    }

    /// The frozen priority table.
    pub fn priorities(&self) -> &PriorityTable {
        &self.priorities
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Map state.
    pub fn map(&self) -> &M {
        &self.map
    }

    /// Map state, mutably (e.g. for the server to add a joining player).
    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// Give back the map state.
    pub fn into_map(self) -> M {
        self.map
    }
}

fn run_map_hooks<M>(
    hooks: &mut [Hook<MapFn<M>>],
    phase: PhaseKind,
    map: &mut M,
    result: &mut TickResult,
) -> Result<(), StepError> {
    for hook in hooks.iter_mut() {
        #[cfg(feature = "debug-tracing")]
        tracing::trace!(hook = %hook.name, "map hook");

        (hook.f)(map).map_err(|source| StepError::Hook {
            phase,
            name: hook.name.clone(),
            source,
        })?;
        result.hooks_run += 1;
    }
    Ok(())
}

fn run_sprite_hooks<M: LayeredMap>(
    hooks: &mut [Hook<SpriteFn<M>>],
    phase: PhaseKind,
    map: &mut M,
    result: &mut TickResult,
) -> Result<(), StepError> {
    if hooks.is_empty() {
        return Ok(());
    }

    // Snapshot: changes to the layer show up next phase
    let sprites = map.sprites().ids();

    for hook in hooks.iter_mut() {
        for sprite in &sprites {
            #[cfg(feature = "debug-tracing")]
            tracing::trace!(hook = %hook.name, sprite = %sprite, "sprite hook");

            (hook.f)(map, *sprite).map_err(|source| StepError::Hook {
                phase,
                name: hook.name.clone(),
                source,
            })?;
            result.hooks_run += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::FixedVec2;
    use crate::diagnostics::MemorySink;
    use crate::map::layers::TileMap;
    use crate::map::object::ObjectLayer;

    #[derive(Default)]
    struct Trace {
        tiles: TileMap,
        calls: Vec<String>,
    }

    impl LayeredMap for Trace {
        fn name(&self) -> &str {
            self.tiles.name()
        }
        fn sprites(&self) -> &ObjectLayer {
            self.tiles.sprites()
        }
        fn sprites_mut(&mut self) -> &mut ObjectLayer {
            self.tiles.sprites_mut()
        }
        fn triggers(&self) -> &ObjectLayer {
            self.tiles.triggers()
        }
        fn triggers_mut(&mut self) -> &mut ObjectLayer {
            self.tiles.triggers_mut()
        }
    }

    fn with_sprites(ids: &[u32]) -> Trace {
        let mut tiles = TileMap::new("trace");
        for id in ids {
            tiles.sprites.insert(MapObject::point(
                ObjectId::new(*id),
                format!("S{}", id),
                "npc",
                FixedVec2::from_ints(*id as i32 * 100, 0),
            ));
        }
        Trace { tiles, calls: Vec::new() }
    }

    fn record(tag: &'static str) -> impl FnMut(&mut Trace, ObjectId) -> anyhow::Result<()> + Send {
        move |map: &mut Trace, sprite: ObjectId| {
            map.calls.push(format!("{}({})", tag, sprite.raw()));
            Ok(())
        }
    }

    #[test]
    fn test_phase_order() {
        let mut step = StepMap::builder(with_sprites(&[1]))
            .sink(MemorySink::new())
            .map_hook("stepMapEndZ", |m: &mut Trace| { m.calls.push("mapEnd".into()); Ok(()) })
            .sprite_hook("stepSpriteEndZ", record("spriteEnd"))
            .sprite_hook("stepMoveZ", record("move"))
            .sprite_hook("stepSpriteStartZ", record("spriteStart"))
            .map_hook("stepMapStartZ", |m: &mut Trace| { m.calls.push("mapStart".into()); Ok(()) })
            .build()
            .unwrap();

        let result = step.tick().unwrap();

        assert_eq!(
            step.map().calls,
            vec!["mapStart", "spriteStart(1)", "move(1)", "spriteEnd(1)", "mapEnd"]
        );
        assert_eq!(result.tick, 1);
        assert_eq!(result.hooks_run, 5);
    }

    #[test]
    fn test_hook_outer_sprite_inner() {
        let mut step = StepMap::builder(with_sprites(&[1, 2]))
            .sink(MemorySink::new())
            .sprite_hook("stepMoveH2", record("H2"))
            .sprite_hook("stepMoveH1", record("H1"))
            .priority(PhaseKind::Move, "stepMoveH1", 10)
            .priority(PhaseKind::Move, "stepMoveH2", 20)
            .build()
            .unwrap();

        step.tick().unwrap();
        assert_eq!(step.map().calls, vec!["H1(1)", "H1(2)", "H2(1)", "H2(2)"]);
    }

    #[test]
    fn test_sprite_snapshot_per_phase() {
        let mut step = StepMap::builder(with_sprites(&[1, 2]))
            .sink(MemorySink::new())
            .sprite_hook("stepSpriteStartRemove", |map: &mut Trace, sprite: ObjectId| {
                // First visit removes sprite 2 and spawns sprite 3
                if sprite.raw() == 1 {
                    map.tiles.sprites.remove(ObjectId::new(2));
                    map.tiles.sprites.insert(MapObject::point(ObjectId::new(3), "S3", "npc", FixedVec2::ZERO));
                }
                Ok(())
            })
            .sprite_hook("stepSpriteStartSee", record("start"))
            .sprite_hook("stepMoveSee", record("move"))
            .priority(PhaseKind::SpriteStart, "stepSpriteStartRemove", 1)
            .build()
            .unwrap();

        step.tick().unwrap();

        // Sprite start still visits the removed sprite; move sees the new set
        assert_eq!(step.map().calls, vec!["start(1)", "start(2)", "move(1)", "move(3)"]);
    }

    #[test]
    fn test_failing_hook_aborts_rest_of_tick() {
        let mut step = StepMap::builder(with_sprites(&[1]))
            .sink(MemorySink::new())
            .sprite_hook("stepMoveFail", |_: &mut Trace, _| Err(anyhow::anyhow!("blocked")))
            .map_hook("stepMapEndAfter", |m: &mut Trace| { m.calls.push("after".into()); Ok(()) })
            .build()
            .unwrap();

        let err = step.tick().unwrap_err();
        assert!(matches!(err, StepError::Hook { phase: PhaseKind::Move, .. }));
        assert!(err.to_string().contains("stepMoveFail"));
        assert!(step.map().calls.is_empty());
    }

    #[test]
    fn test_set_priority_after_build_is_rejected() {
        let sink = MemorySink::new();
        let mut step = StepMap::builder(with_sprites(&[1]))
            .sink(sink.clone())
            .config(StepMapConfig { log_inventory: false, ..Default::default() })
            .sprite_hook("stepMoveA", record("A"))
            .sprite_hook("stepMoveB", record("B"))
            .build()
            .unwrap();

        let digest = step.schedule_digest();
        step.set_priority(PhaseKind::Move, "stepMoveB", 1);

        assert_eq!(step.schedule_digest(), digest);
        assert_eq!(step.priority(PhaseKind::Move, "stepMoveB"), 50);
        assert_eq!(sink.messages(Severity::Warning).len(), 1);
    }

    #[test]
    fn test_config_overrides_apply_before_init() {
        let config = StepMapConfig::default()
            .with_override("stepMove", "stepMoveB", 5)
            .with_override("Move", "stepMoveA", 7)
            .with_override("stepBogus", "stepMoveA", 1);
        let sink = MemorySink::new();

        let step = StepMap::builder(with_sprites(&[]))
            .sink(sink.clone())
            .config(config)
            .sprite_hook("stepMoveA", record("A"))
            .sprite_hook("stepMoveB", record("B"))
            .init("initTune", |ctx| {
                // Sees the config value, then replaces it
                assert_eq!(ctx.priority(PhaseKind::Move, "stepMoveA"), 7);
                ctx.set_priority(PhaseKind::Move, "stepMoveA", 3);
                Ok(())
            })
            .build()
            .unwrap();

        assert_eq!(step.hook_order(PhaseKind::Move), vec![("stepMoveA", 3), ("stepMoveB", 5)]);
        assert_eq!(sink.messages(Severity::Warning).len(), 1);
    }

    #[test]
    fn test_inventory_logged_at_verbose() {
        let sink = MemorySink::new();
        StepMap::builder(with_sprites(&[]))
            .sink(sink.clone())
            .sprite_hook("stepMoveWalk", record("walk"))
            .build()
            .unwrap();

        let verbose = sink.messages(Severity::Verbose);
        assert_eq!(verbose.len(), 1);
        assert!(verbose[0].starts_with("Map 'trace' Hooks:"));
        assert!(verbose[0].contains("stepMoveWalk/50"));
    }

    #[test]
    fn test_report_lists_unmatched_priorities() {
        let step = StepMap::builder(with_sprites(&[]))
            .sink(MemorySink::new())
            .sprite_hook("stepMoveWalk", record("walk"))
            .priority(PhaseKind::Move, "stepMoveWlak", 5)
            .init("initDoors", |_| Ok(()))
            .build()
            .unwrap();

        let report = step.diagnostics_report();
        assert!(report.contains("stepMoveWalk/50"));
        assert!(report.contains("stepMoveWlak/5 (Move)"));
        assert!(report.contains("initDoors"));
    }

    #[test]
    fn test_sprites_added_between_ticks() {
        let mut step = StepMap::builder(with_sprites(&[1]))
            .sink(MemorySink::new())
            .sprite_hook("stepMoveSee", record("move"))
            .build()
            .unwrap();

        step.tick().unwrap();
        // A player joins while the map is idle
        step.map_mut()
            .tiles
            .sprites
            .insert(MapObject::point(ObjectId::new(7), "S7", "player", FixedVec2::ZERO));
        step.tick().unwrap();

        let map = step.into_map();
        assert_eq!(map.calls, vec!["move(1)", "move(1)", "move(7)"]);
    }

    #[test]
    fn test_init_report_reaches_sink() {
        let sink = MemorySink::new();
        StepMap::builder(with_sprites(&[1, 2]))
            .sink(sink.clone())
            .init("initCount", |ctx| {
                let count = ctx.map().sprites().len();
                ctx.report(Severity::Info, &format!("{} sprites", count));
                Ok(())
            })
            .build()
            .unwrap();

        assert_eq!(sink.messages(Severity::Info), vec!["2 sprites".to_string()]);
    }

    #[test]
    fn test_tick_counter() {
        let mut step = StepMap::builder(with_sprites(&[]))
            .sink(MemorySink::new())
            .build()
            .unwrap();

        assert_eq!(step.tick_count(), 0);
        step.tick().unwrap();
        let result = step.tick().unwrap();
        assert_eq!(result.tick, 2);
        assert_eq!(step.tick_count(), 2);
    }
}
