//! # Tilestep
//!
//! Per-tick hook dispatch for tile maps. Independently written game mechanics
//! register named hooks; a map runs them in a fixed phase order every tick.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         TILESTEP                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point coordinates            │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  └── hash.rs     - Schedule hashing                          │
//! │                                                              │
//! │  map/            - Map collaborators                         │
//! │  ├── object.rs   - Map objects and object layers             │
//! │  ├── layers.rs   - Sprite and trigger layers                 │
//! │  └── geometry.rs - Point-in-shape containment                │
//! │                                                              │
//! │  step/           - Hook dispatch                             │
//! │  ├── phase.rs    - Phases and name prefixes                  │
//! │  ├── priority.rs - Per-phase priority table                  │
//! │  ├── registry.rs - Hook registration and sorting             │
//! │  ├── trigger.rs  - Trigger resolution                        │
//! │  ├── report.rs   - Hook inventory report                     │
//! │  └── executor.rs - Tick loop                                 │
//! │                                                              │
//! │  diagnostics.rs  - Severity-tagged diagnostics               │
//! │  config.rs       - Declarative priority overrides            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Hook order depends only on registered names and priorities:
//! - Buckets sort by `(priority, name)`, once per map
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No floating-point in containment tests
//!
//! Two maps built from the same mechanics and overrides produce the same
//! `schedule_digest`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod map;
pub mod step;
pub mod diagnostics;
pub mod config;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use map::{GeometryOracle, LayeredMap, MapObject, ObjectId, ObjectLayer, Shape, ShapeOracle, TileMap};
pub use step::{HookRegistry, InitContext, Mechanic, PhaseKind, StepError, StepMap, StepMapBuilder, TickResult};
pub use diagnostics::{DiagnosticSink, MemorySink, Severity, TracingSink};
pub use config::{ConfigError, PriorityOverride, StepMapConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
