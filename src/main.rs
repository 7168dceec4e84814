//! Tilestep demo
//!
//! Builds a small corridor map with three mechanics and steps it forward.
//! Pass a JSON config path as the first argument to override priorities.
//!
//! `RUST_LOG=debug` shows the hook inventory logged at build time.

use std::collections::BTreeMap;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tilestep::{
    core::fixed::from_int,
    map::ObjectLayer,
    FixedVec2, HookRegistry, LayeredMap, MapObject, Mechanic, ObjectId, PhaseKind, StepMap,
    Severity, StepMapConfig, TileMap, VERSION,
};

/// Ticks the demo runs for
const DEMO_TICKS: u64 = 8;

/// Width of one tile, in map pixels
const TILE: i32 = 32;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Tilestep v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => StepMapConfig::from_file(&path).with_context(|| format!("loading config {}", path))?,
        None => StepMapConfig::default(),
    };
    info!("Priority overrides: {}", config.priority_overrides.len());

    demo_map(config)
}

/// Corridor state: the tile layers plus what the mechanics track.
struct Corridor {
    tiles: TileMap,
    hp: BTreeMap<ObjectId, i32>,
    doors_used: u32,
}

impl LayeredMap for Corridor {
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

/// Sprites with a `speed` property walk right every tick.
struct Walk;

impl Mechanic<Corridor> for Walk {
    fn name(&self) -> &str {
        "Walk"
    }

    fn register(&self, hooks: &mut HookRegistry<Corridor>) {
        hooks.sprite_hook("stepMoveWalk", |map: &mut Corridor, sprite| {
            if let Some(object) = map.tiles.sprites.get_mut(sprite) {
                let speed = object.property("speed").map(str::parse::<i32>).transpose()?.unwrap_or(0);
                object.anchor = object.anchor + FixedVec2::from_ints(speed, 0);
            }
            Ok(())
        });
    }
}

/// Doors send a sprite to their `targetX`/`targetY` and end its triggers.
struct Doors;

impl Mechanic<Corridor> for Doors {
    fn name(&self) -> &str {
        "Doors"
    }

    fn register(&self, hooks: &mut HookRegistry<Corridor>) {
        hooks
            .trigger("mapDoor", |map: &mut Corridor, door: &MapObject, sprite| {
                let target = FixedVec2::from_ints(coord(door, "targetX")?, coord(door, "targetY")?);
                if let Some(object) = map.tiles.sprites.get_mut(sprite) {
                    object.anchor = target;
                }
                map.doors_used += 1;
                Ok(true)
            })
            .priority(PhaseKind::Trigger, "triggerMapDoor", 10);
    }
}

/// Heal zones restore 10 hp per tick, up to 100.
struct Heal;

impl Mechanic<Corridor> for Heal {
    fn name(&self) -> &str {
        "Heal"
    }

    fn register(&self, hooks: &mut HookRegistry<Corridor>) {
        hooks
            .init("initHeal", |ctx| {
                let map = ctx.map();
                let ids = map.tiles.sprites.ids();
                for id in &ids {
                    map.hp.insert(*id, 50);
                }
                ctx.report(Severity::Info, &format!("Heal: {} sprites start at 50 hp", ids.len()));
                Ok(())
            })
            .trigger("heal", |map: &mut Corridor, _zone: &MapObject, sprite| {
                let hp = map.hp.entry(sprite).or_insert(0);
                *hp = (*hp + 10).min(100);
                Ok(false)
            })
            .priority(PhaseKind::Trigger, "triggerHeal", 5);
    }
}

fn coord(object: &MapObject, key: &str) -> anyhow::Result<i32> {
    let value = object
        .property(key)
        .with_context(|| format!("{} has no {}", object.name, key))?;
    Ok(value.parse::<i32>()?)
}

/// Corridor: heal zone, lava (no handler), and a door back to the start.
fn corridor() -> Corridor {
    let tiles = TileMap::new("corridor")
        .with_sprite(
            MapObject::point(ObjectId::new(1), "hero", "player", FixedVec2::from_ints(0, TILE / 2))
                .with_property("speed", TILE.to_string()),
        )
        .with_sprite(MapObject::point(ObjectId::new(2), "slime", "npc", FixedVec2::from_ints(80, TILE / 2)))
        .with_trigger(MapObject::rect(
            ObjectId::new(10),
            "spring",
            "heal",
            FixedVec2::from_ints(2 * TILE, 0),
            from_int(2 * TILE),
            from_int(TILE),
        ))
        .with_trigger(MapObject::rect(
            ObjectId::new(11),
            "pit",
            "lava",
            FixedVec2::from_ints(3 * TILE, 0),
            from_int(TILE),
            from_int(TILE),
        ))
        .with_trigger(
            MapObject::rect(
                ObjectId::new(12),
                "exit",
                "mapDoor",
                FixedVec2::from_ints(5 * TILE, 0),
                from_int(TILE),
                from_int(TILE),
            )
            .with_property("targetX", "0")
            .with_property("targetY", (TILE / 2).to_string()),
        );

    Corridor {
        tiles,
        hp: BTreeMap::new(),
        doors_used: 0,
    }
}

/// Build the corridor and run it.
fn demo_map(config: StepMapConfig) -> anyhow::Result<()> {
    info!("=== Building Corridor ===");

    let mut step = StepMap::builder(corridor())
        .config(config)
        .mechanic(Walk)
        .mechanic(Doors)
        .mechanic(Heal)
        .build()
        .context("building corridor")?;

    info!("Hook inventory:\n{}", step.diagnostics_report());
    let digest = step.schedule_digest();
    info!("Schedule digest: {}", hex::encode(digest));

    info!("Running {} ticks...", DEMO_TICKS);

    for _ in 0..DEMO_TICKS {
        let result = step.tick()?;
        let hero = step
            .map()
            .tiles
            .sprites
            .get(ObjectId::new(1))
            .map(|object| object.anchor.to_floats())
            .unwrap_or_default();

        info!(
            tick = result.tick,
            hooks = result.hooks_run,
            triggers = result.triggers_fired,
            dropped = result.triggers_dropped,
            stopped = result.sprites_stopped,
            "hero at ({:.0}, {:.0})",
            hero.0,
            hero.1
        );
    }

    let ticks = step.tick_count();
    let after = step.schedule_digest();

    info!("=== Results ===");
    let corridor = step.into_map();
    for (id, hp) in &corridor.hp {
        let name = corridor.tiles.sprites.get(*id).map(|o| o.name.as_str()).unwrap_or("?");
        info!("{} {}: {} hp", id, name, hp);
    }
    info!("Doors used: {}", corridor.doors_used);

    // Ticking never reorders hooks
    if after == digest {
        info!("SCHEDULE STABLE: digest unchanged after {} ticks", ticks);
    } else {
        info!("SCHEDULE CHANGED: {}", hex::encode(after));
    }

    Ok(())
}
