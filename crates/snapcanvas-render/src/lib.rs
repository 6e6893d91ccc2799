//! # snapcanvas Renderer
//!
//! Render surfaces backed by tiny-skia pixmaps, and raw RGBA pixel export.
//!
//! A [`RenderSurface`] can be snapshotted off-screen at any multiplier and
//! crop without disturbing its live state ([`snapshot`]), and a single
//! [`snapcanvas_core::SceneObject`] can be exported on its own through a
//! disposable scratch surface ([`isolation`]). Host primitives such as
//! target allocation and pixel read-back are installed once into a
//! [`Platform`] registry.

pub mod error;
pub mod isolation;
pub mod options;
pub mod paint;
pub mod pixels;
pub mod platform;
pub mod scene;
pub mod snapshot;
pub mod surface;
pub mod target;
pub mod viewport;

pub use error::{Capability, ExportError, Result};
pub use isolation::export_object_pixels;
pub use options::ExportOptions;
pub use pixels::PixelBuffer;
pub use platform::{Platform, SurfaceExporter};
pub use scene::Scene;
pub use snapshot::{capture_render_target, export_pixels, SnapshotExporter};
pub use surface::{RenderSurface, SurfaceConfig, SurfaceState};
pub use target::{
    PixelReadback, PixmapAllocator, PixmapReadback, RenderTarget, TargetAllocator, TargetId,
};
pub use viewport::Viewport;
