use std::collections::HashSet;

use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::BBox;
use crate::object::{ObjectId, SceneObject};

/// An object's bounding rect as stored in the R-tree.
#[derive(Debug, Clone)]
pub struct ObjectEnvelope {
    pub object_id: ObjectId,
    pub bbox: BBox,
}

impl RTreeObject for ObjectEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Viewport culling over object bounding rects.
///
/// Objects whose rect is not a finite, non-inverted box cannot be placed in
/// the tree; they are kept aside and never culled.
pub struct CullingIndex {
    tree: RTree<ObjectEnvelope>,
    unbounded: HashSet<ObjectId>,
}

impl CullingIndex {
    pub fn from_objects<'a>(objects: impl IntoIterator<Item = &'a SceneObject>) -> Self {
        let mut envelopes = Vec::new();
        let mut unbounded = HashSet::new();
        for object in objects {
            let bbox = object.bounding_rect();
            if bbox.is_finite() && bbox.width() >= 0.0 && bbox.height() >= 0.0 {
                envelopes.push(ObjectEnvelope {
                    object_id: object.id,
                    bbox,
                });
            } else {
                unbounded.insert(object.id);
            }
        }
        Self {
            tree: RTree::bulk_load(envelopes),
            unbounded,
        }
    }

    /// Ids that may be visible through `viewport`.
    pub fn visible_in(&self, viewport: &BBox) -> HashSet<ObjectId> {
        let envelope = AABB::from_corners(
            [viewport.min.x, viewport.min.y],
            [viewport.max.x, viewport.max.y],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.object_id)
            .chain(self.unbounded.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size() + self.unbounded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_culls_objects_outside_viewport() {
        let near = SceneObject::rect(10.0, 10.0);
        let far = SceneObject::rect(10.0, 10.0).with_position(100.0, 100.0);
        let index = CullingIndex::from_objects([&near, &far]);
        assert_eq!(index.len(), 2);

        let visible = index.visible_in(&BBox::from_xywh(-5.0, -5.0, 20.0, 20.0));
        assert!(visible.contains(&near.id));
        assert!(!visible.contains(&far.id));
    }

    #[test]
    fn test_unbounded_objects_are_never_culled() {
        let broken = SceneObject::rect(10.0, 10.0).with_position(f64::NAN, 0.0);
        let index = CullingIndex::from_objects([&broken]);
        let visible = index.visible_in(&BBox::from_xywh(500.0, 500.0, 1.0, 1.0));
        assert!(visible.contains(&broken.id));
    }
}
