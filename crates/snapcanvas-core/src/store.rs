use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::object::{ObjectId, SceneObject};

/// Arena owning every scene object, keyed by id.
///
/// Surfaces refer to objects by id only, so tearing a surface down never
/// destroys the objects it displayed.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ObjectStore {
    objects: HashMap<ObjectId, SceneObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.objects.insert(id, object);
        id
    }

    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    pub fn remove(&mut self, id: &ObjectId) -> Option<SceneObject> {
        self.objects.remove(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let store: Self = serde_json::from_str(json)?;
        debug!("loaded {} scene objects", store.len());
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    #[test]
    fn test_add_and_get() {
        let mut store = ObjectStore::new();
        let id = store.add(SceneObject::rect(10.0, 20.0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().width, 10.0);
        assert!(store.remove(&id).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_round_trip_drops_owner() {
        let mut store = ObjectStore::new();
        let mut obj = SceneObject::ellipse(4.0, 6.0).with_fill(Rgba::rgb(255, 0, 0));
        obj.attach(uuid::Uuid::new_v4());
        let id = store.add(obj);

        let json = store.to_json().unwrap();
        let back = ObjectStore::from_json(&json).unwrap();
        let restored = back.get(&id).unwrap();
        assert_eq!(restored.fill, Some(Rgba::rgb(255, 0, 0)));
        assert!(restored.owner().is_none());
    }
}
