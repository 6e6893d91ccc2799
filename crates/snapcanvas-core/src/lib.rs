//! # snapcanvas Core
//!
//! Scene objects with their transform model, geometric primitives, the
//! id-keyed object arena and an R-tree spatial index for viewport culling.
//!
//! Rendering and pixel export live in `snapcanvas-render`.

pub mod color;
pub mod geometry;
pub mod object;
pub mod spatial;
pub mod store;

pub use color::Rgba;
pub use geometry::{Affine, BBox, CropWindow, Point};
pub use object::{
    ObjectId, ObjectTransform, OriginX, OriginY, SceneObject, Shape, SurfaceId, TransformRecord,
};
pub use store::ObjectStore;
