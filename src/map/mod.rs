//! Map Collaborators
//!
//! Narrow interfaces the step dispatcher consumes from a loaded map.
//!
//! - `object`: object ids, shapes, and ordered object layers
//! - `layers`: the `LayeredMap` trait and the stock `TileMap`
//! - `geometry`: trigger containment queries

pub mod object;
pub mod layers;
pub mod geometry;

pub use object::{MapObject, ObjectId, ObjectLayer, Shape};
pub use layers::{LayeredMap, TileMap};
pub use geometry::{GeometryOracle, ShapeOracle};
