//! Layered Map State
//!
//! The dispatcher reads two layers from whatever state type a map uses:
//! sprites (objects that hooks act on) and triggers (areas that react to
//! sprites). Mechanic state types embed a `TileMap` and delegate to it.

use serde::{Serialize, Deserialize};

use crate::map::object::{MapObject, ObjectLayer};

/// Access to the sprite and trigger layers of a loaded map.
pub trait LayeredMap {
    /// Map name, used in diagnostics.
    fn name(&self) -> &str;

    /// Objects on the sprite layer.
    fn sprites(&self) -> &ObjectLayer;

    /// Objects on the sprite layer, mutably.
    fn sprites_mut(&mut self) -> &mut ObjectLayer;

    /// Objects on the trigger layer.
    fn triggers(&self) -> &ObjectLayer;

    /// Objects on the trigger layer, mutably.
    fn triggers_mut(&mut self) -> &mut ObjectLayer;
}

/// Stock map state: a name and the two object layers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TileMap {
    /// Map name
    pub name: String,
    /// Sprite layer
    pub sprites: ObjectLayer,
    /// Trigger layer
    pub triggers: ObjectLayer,
}

impl TileMap {
    /// Create an empty map.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sprites: ObjectLayer::new(),
            triggers: ObjectLayer::new(),
        }
    }

    /// Add an object to the sprite layer.
    pub fn with_sprite(mut self, sprite: MapObject) -> Self {
        self.sprites.insert(sprite);
        self
    }

    /// Add an object to the trigger layer.
    pub fn with_trigger(mut self, trigger: MapObject) -> Self {
        self.triggers.insert(trigger);
        self
    }

    /// Load a map from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl LayeredMap for TileMap {
    fn name(&self) -> &str {
        &self.name
    }

    fn sprites(&self) -> &ObjectLayer {
        &self.sprites
    }

    fn sprites_mut(&mut self) -> &mut ObjectLayer {
        &mut self.sprites
    }

    fn triggers(&self) -> &ObjectLayer {
        &self.triggers
    }

    fn triggers_mut(&mut self) -> &mut ObjectLayer {
        &mut self.triggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::FixedVec2;
    use crate::map::object::ObjectId;

    #[test]
    fn test_object_on_both_layers_shares_id() {
        let chest = MapObject::point(ObjectId::new(4), "chest", "chest", FixedVec2::from_ints(8, 8));
        let map = TileMap::new("start")
            .with_sprite(chest.clone())
            .with_trigger(chest);

        assert!(map.sprites().contains(ObjectId::new(4)));
        assert!(map.triggers().contains(ObjectId::new(4)));
    }

    #[test]
    fn test_tile_map_from_json() {
        let json = r#"{
            "name": "start",
            "sprites": { "objects": {} },
            "triggers": { "objects": {} }
        }"#;
        let map = TileMap::from_json_str(json).unwrap();
        assert_eq!(map.name(), "start");
        assert!(map.sprites().is_empty());
    }
}
