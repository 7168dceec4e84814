//! Map Objects and Layers
//!
//! Objects placed on a map's sprite and trigger layers. Layers are keyed by
//! `ObjectId` in a BTreeMap so iteration order never depends on hashing.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::core::vec2::FixedVec2;

// =============================================================================
// OBJECT ID
// =============================================================================

/// Map object identifier.
///
/// An object that sits on both the sprite layer and the trigger layer carries
/// the same id on both, which is how a sprite is kept from triggering itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Create from a raw map file id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// SHAPE
// =============================================================================

/// Area covered by an object, in map pixels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// A bare point. Covers no area.
    Point,
    /// Axis-aligned rectangle with top-left corner at (x, y).
    Rect {
        x: Fixed,
        y: Fixed,
        width: Fixed,
        height: Fixed,
    },
    /// Axis-aligned ellipse inscribed in the given bounding box.
    Ellipse {
        x: Fixed,
        y: Fixed,
        width: Fixed,
        height: Fixed,
    },
    /// Closed polygon, absolute vertices in order.
    Polygon(Vec<FixedVec2>),
}

// =============================================================================
// MAP OBJECT
// =============================================================================

/// An object on a sprite or trigger layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapObject {
    /// Object id (shared across layers for the same object)
    pub id: ObjectId,

    /// Display name
    pub name: String,

    /// Object type tag; on the trigger layer it selects the handler
    #[serde(rename = "type")]
    pub type_tag: String,

    /// Point used for trigger containment tests
    pub anchor: FixedVec2,

    /// Covered area
    pub shape: Shape,

    /// Free-form custom properties from the map file
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl MapObject {
    /// Create a point object (typical sprite).
    pub fn point(id: ObjectId, name: impl Into<String>, type_tag: impl Into<String>, anchor: FixedVec2) -> Self {
        Self {
            id,
            name: name.into(),
            type_tag: type_tag.into(),
            anchor,
            shape: Shape::Point,
            properties: BTreeMap::new(),
        }
    }

    /// Create a rectangle object anchored at its top-left corner (typical trigger).
    pub fn rect(
        id: ObjectId,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        top_left: FixedVec2,
        width: Fixed,
        height: Fixed,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            type_tag: type_tag.into(),
            anchor: top_left,
            shape: Shape::Rect { x: top_left.x, y: top_left.y, width, height },
            properties: BTreeMap::new(),
        }
    }

    /// Attach a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a custom property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

// =============================================================================
// OBJECT LAYER
// =============================================================================

/// Ordered collection of map objects.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObjectLayer {
    objects: BTreeMap<ObjectId, MapObject>,
}

impl ObjectLayer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object. Returns the replaced object, if any.
    pub fn insert(&mut self, object: MapObject) -> Option<MapObject> {
        self.objects.insert(object.id, object)
    }

    /// Remove an object.
    pub fn remove(&mut self, id: ObjectId) -> Option<MapObject> {
        self.objects.remove(&id)
    }

    /// Get an object.
    pub fn get(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.get(&id)
    }

    /// Get an object mutably.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut MapObject> {
        self.objects.get_mut(&id)
    }

    /// Does the layer hold this id?
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Snapshot of the ids currently on the layer, in id order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    /// Iterate objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &MapObject> {
        self.objects.values()
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Is the layer empty?
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FromIterator<MapObject> for ObjectLayer {
    fn from_iter<T: IntoIterator<Item = MapObject>>(iter: T) -> Self {
        let mut layer = Self::new();
        for object in iter {
            layer.insert(object);
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_iterates_in_id_order() {
        let layer: ObjectLayer = [3, 1, 2]
            .into_iter()
            .map(|i| MapObject::point(ObjectId::new(i), format!("s{}", i), "npc", FixedVec2::ZERO))
            .collect();

        assert_eq!(layer.ids(), vec![ObjectId::new(1), ObjectId::new(2), ObjectId::new(3)]);
        assert_eq!(layer.len(), 3);
    }

    #[test]
    fn test_layer_insert_replaces_same_id() {
        let mut layer = ObjectLayer::new();
        layer.insert(MapObject::point(ObjectId::new(1), "a", "npc", FixedVec2::ZERO));
        let old = layer.insert(MapObject::point(ObjectId::new(1), "b", "npc", FixedVec2::ZERO));

        assert_eq!(old.map(|o| o.name), Some("a".to_string()));
        assert_eq!(layer.get(ObjectId::new(1)).map(|o| o.name.as_str()), Some("b"));
    }

    #[test]
    fn test_object_type_serializes_as_type() {
        let object = MapObject::point(ObjectId::new(7), "door", "mapDoor", FixedVec2::from_ints(1, 2))
            .with_property("destMap", "cave");
        let json = serde_json::to_value(&object).unwrap();

        assert_eq!(json["type"], "mapDoor");
        assert_eq!(json["properties"]["destMap"], "cave");

        let back: MapObject = serde_json::from_value(json).unwrap();
        assert_eq!(back, object);
        assert_eq!(back.property("destMap"), Some("cave"));
    }
}
