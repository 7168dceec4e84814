//! Step Phases
//!
//! A tick runs six phases in a fixed order. A seventh kind, `Init`, runs once
//! while the map is built. Hook names carry their phase as a camelCase
//! prefix (`stepMoveWalk` is a `Move` hook for the `Walk` mechanic).

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

/// Hook phase kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PhaseKind {
    /// Once, at map construction
    Init = 0,
    /// Once per tick, before sprites are touched
    MapStart = 1,
    /// Per sprite, start of tick
    SpriteStart = 2,
    /// Per (trigger, sprite) pair where the sprite anchor is inside the trigger
    Trigger = 3,
    /// Per sprite, movement
    Move = 4,
    /// Per sprite, end of tick
    SpriteEnd = 5,
    /// Once per tick, after sprites are done
    MapEnd = 6,
}

/// Tick phases in execution order. Never reordered.
pub const TICK_PHASES: [PhaseKind; 6] = [
    PhaseKind::MapStart,
    PhaseKind::SpriteStart,
    PhaseKind::Trigger,
    PhaseKind::Move,
    PhaseKind::SpriteEnd,
    PhaseKind::MapEnd,
];

/// Every kind, `Init` first.
pub const ALL_KINDS: [PhaseKind; 7] = [
    PhaseKind::Init,
    PhaseKind::MapStart,
    PhaseKind::SpriteStart,
    PhaseKind::Trigger,
    PhaseKind::Move,
    PhaseKind::SpriteEnd,
    PhaseKind::MapEnd,
];

/// How a phase's hooks are called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookShape {
    /// `hook(ctx)` at construction
    Init,
    /// `hook(map)`
    Map,
    /// `hook(map, sprite)`
    Sprite,
    /// `hook(map, trigger, sprite) -> stop`
    Trigger,
}

impl PhaseKind {
    /// Name prefix that classifies a hook into this kind.
    ///
    /// The seven prefixes are mutually exclusive: none is a prefix of another.
    pub const fn prefix(self) -> &'static str {
        match self {
            PhaseKind::Init => "init",
            PhaseKind::MapStart => "stepMapStart",
            PhaseKind::SpriteStart => "stepSpriteStart",
            PhaseKind::Trigger => "trigger",
            PhaseKind::Move => "stepMove",
            PhaseKind::SpriteEnd => "stepSpriteEnd",
            PhaseKind::MapEnd => "stepMapEnd",
        }
    }

    /// Calling convention for this kind.
    pub const fn shape(self) -> HookShape {
        match self {
            PhaseKind::Init => HookShape::Init,
            PhaseKind::MapStart | PhaseKind::MapEnd => HookShape::Map,
            PhaseKind::SpriteStart | PhaseKind::Move | PhaseKind::SpriteEnd => HookShape::Sprite,
            PhaseKind::Trigger => HookShape::Trigger,
        }
    }

    /// Is this one of the six tick phases?
    pub const fn is_tick_phase(self) -> bool {
        !matches!(self, PhaseKind::Init)
    }

    /// Classify a hook name by exact prefix.
    ///
    /// A name equal to a bare prefix has no mechanic suffix and is not a hook.
    pub fn classify(name: &str) -> Option<PhaseKind> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|kind| name.len() > kind.prefix().len() && name.starts_with(kind.prefix()))
    }

    /// Parse a phase from its prefix tag (`"stepMove"`) or its variant name
    /// (`"Move"`). Case-sensitive.
    pub fn from_tag(tag: &str) -> Option<PhaseKind> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|kind| kind.prefix() == tag || kind.variant_name() == tag)
    }

    /// Column heading used in inventory reports, e.g. `stepMove*(sprite)`.
    pub fn signature(self) -> String {
        let args = match self.shape() {
            HookShape::Init | HookShape::Map => "()",
            HookShape::Sprite => "(sprite)",
            HookShape::Trigger => "(trigger, sprite)",
        };
        format!("{}*{}", self.prefix(), args)
    }

    fn variant_name(self) -> &'static str {
        match self {
            PhaseKind::Init => "Init",
            PhaseKind::MapStart => "MapStart",
            PhaseKind::SpriteStart => "SpriteStart",
            PhaseKind::Trigger => "Trigger",
            PhaseKind::Move => "Move",
            PhaseKind::SpriteEnd => "SpriteEnd",
            PhaseKind::MapEnd => "MapEnd",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variant_name())
    }
}

/// Error returned when a phase tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown phase tag: {0}")]
pub struct UnknownPhase(pub String);

impl FromStr for PhaseKind {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseKind::from_tag(s).ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_prefix() {
        assert_eq!(PhaseKind::classify("initDoors"), Some(PhaseKind::Init));
        assert_eq!(PhaseKind::classify("stepMapStartClock"), Some(PhaseKind::MapStart));
        assert_eq!(PhaseKind::classify("stepSpriteStartReset"), Some(PhaseKind::SpriteStart));
        assert_eq!(PhaseKind::classify("triggerMapDoor"), Some(PhaseKind::Trigger));
        assert_eq!(PhaseKind::classify("stepMoveWalk"), Some(PhaseKind::Move));
        assert_eq!(PhaseKind::classify("stepSpriteEndSave"), Some(PhaseKind::SpriteEnd));
        assert_eq!(PhaseKind::classify("stepMapEndFlush"), Some(PhaseKind::MapEnd));
    }

    #[test]
    fn test_classify_rejects_bare_prefix_and_other_names() {
        assert_eq!(PhaseKind::classify("stepMove"), None);
        assert_eq!(PhaseKind::classify("trigger"), None);
        assert_eq!(PhaseKind::classify("init"), None);
        assert_eq!(PhaseKind::classify("getSprite"), None);
        assert_eq!(PhaseKind::classify("StepMoveWalk"), None);
        assert_eq!(PhaseKind::classify("step"), None);
    }

    #[test]
    fn test_prefixes_are_mutually_exclusive() {
        for a in ALL_KINDS {
            for b in ALL_KINDS {
                if a != b {
                    assert!(
                        !a.prefix().starts_with(b.prefix()),
                        "{} overlaps {}",
                        a.prefix(),
                        b.prefix()
                    );
                }
            }
        }
    }

    #[test]
    fn test_tick_phase_order() {
        assert!(TICK_PHASES.windows(2).all(|w| w[0] < w[1]));
        assert!(TICK_PHASES.iter().all(|p| p.is_tick_phase()));
        assert!(!PhaseKind::Init.is_tick_phase());
    }

    #[test]
    fn test_from_tag() {
        assert_eq!("stepMove".parse::<PhaseKind>(), Ok(PhaseKind::Move));
        assert_eq!("Trigger".parse::<PhaseKind>(), Ok(PhaseKind::Trigger));
        assert!("stepmove".parse::<PhaseKind>().is_err());
        assert!("stepTeleport".parse::<PhaseKind>().is_err());
    }

    #[test]
    fn test_signature() {
        assert_eq!(PhaseKind::MapStart.signature(), "stepMapStart*()");
        assert_eq!(PhaseKind::Move.signature(), "stepMove*(sprite)");
        assert_eq!(PhaseKind::Trigger.signature(), "trigger*(trigger, sprite)");
    }
}
