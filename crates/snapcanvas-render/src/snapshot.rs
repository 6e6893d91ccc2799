//! Surface snapshot export.
//!
//! The surface is temporarily reconfigured (size, viewport, render target,
//! interactivity), rendered once into a fresh off-screen target and then put
//! back exactly as it was. [`SnapshotGuard`] owns the saved state and restores
//! it on every exit path, including errors and panics.
//!
//! The off-screen viewport is always axis-aligned: rotation or skew in the
//! surface's own viewport transform is dropped for the export.

use std::ops::{Deref, DerefMut};

use log::debug;
use snapcanvas_core::{Affine, CropWindow, ObjectStore, Point};

use crate::error::{ExportError, Result};
use crate::options::{validate_crop, ExportOptions};
use crate::pixels::PixelBuffer;
use crate::platform::{Platform, SurfaceExporter};
use crate::surface::RenderSurface;
use crate::target::RenderTarget;
use crate::viewport::Viewport;

struct SavedState {
    viewport: Viewport,
    width: u32,
    height: u32,
    target: RenderTarget,
    interactive: bool,
}

/// Holds a surface reconfigured for an off-screen pass.
///
/// Dropping the guard restores the surface; [`SnapshotGuard::finish`]
/// restores it and hands back the off-screen target.
pub struct SnapshotGuard<'a> {
    surface: &'a mut RenderSurface,
    saved: Option<SavedState>,
}

impl<'a> SnapshotGuard<'a> {
    /// Install `viewport` and `target` on the surface, sizing it to the target.
    pub fn enter(surface: &'a mut RenderSurface, viewport: Affine, target: RenderTarget) -> Self {
        let (width, height) = (target.width(), target.height());
        let saved_viewport = surface.viewport;
        let saved_width = surface.width;
        let saved_height = surface.height;
        let saved_interactive = surface.interactive;

        surface.interactive = false;
        surface.viewport = Viewport::from_transform(viewport);
        surface.width = width;
        surface.height = height;
        surface.calc_viewport_boundaries();
        let live_target = std::mem::replace(&mut surface.target, target);

        Self {
            surface,
            saved: Some(SavedState {
                viewport: saved_viewport,
                width: saved_width,
                height: saved_height,
                target: live_target,
                interactive: saved_interactive,
            }),
        }
    }

    /// Restore the surface and return the off-screen target.
    pub fn finish(mut self) -> RenderTarget {
        let Some(saved) = self.saved.take() else {
            // Only `finish` and `drop` take the saved state; both consume the guard.
            unreachable!("snapshot state restored twice");
        };
        restore(self.surface, saved)
    }
}

/// Undo `SnapshotGuard::enter` in reverse order, returning the off-screen target.
fn restore(surface: &mut RenderSurface, saved: SavedState) -> RenderTarget {
    let offscreen = std::mem::replace(&mut surface.target, saved.target);
    surface.width = saved.width;
    surface.height = saved.height;
    surface.viewport = saved.viewport;
    surface.calc_viewport_boundaries();
    surface.interactive = saved.interactive;
    offscreen
}

impl Deref for SnapshotGuard<'_> {
    type Target = RenderSurface;

    fn deref(&self) -> &RenderSurface {
        self.surface
    }
}

impl DerefMut for SnapshotGuard<'_> {
    fn deref_mut(&mut self) -> &mut RenderSurface {
        self.surface
    }
}

impl Drop for SnapshotGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            restore(self.surface, saved);
            debug!("restored surface {} after an aborted export", self.surface.id());
        }
    }
}

/// Axis-aligned viewport for an export at `multiplier` with its top-left
/// corner at the unscaled crop `offset`.
pub fn offscreen_viewport(current: &Affine, multiplier: f64, offset: Point) -> Affine {
    let zoom = current.scale_x() * multiplier;
    Affine::new(
        zoom,
        0.0,
        0.0,
        zoom,
        (current.translate_x() - offset.x) * multiplier,
        (current.translate_y() - offset.y) * multiplier,
    )
}

fn scaled_extent(name: &str, extent: f64, multiplier: f64) -> Result<u32> {
    let scaled = (extent * multiplier).round();
    if !scaled.is_finite() || scaled < 1.0 || scaled > f64::from(u32::MAX) {
        return Err(ExportError::InvalidOptions(format!(
            "export {name} of {extent} x {multiplier} does not fit a render target"
        )));
    }
    Ok(scaled as u32)
}

/// Render `surface` into a new off-screen target at `multiplier`, cropped to
/// `crop`. The surface is left exactly as it was found.
pub fn capture_render_target(
    platform: &Platform,
    surface: &mut RenderSurface,
    objects: &ObjectStore,
    multiplier: f64,
    crop: &CropWindow,
) -> Result<RenderTarget> {
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(ExportError::InvalidOptions(format!(
            "multiplier must be positive, got {multiplier}"
        )));
    }
    let multiplier = if multiplier == 0.0 { 1.0 } else { multiplier };
    validate_crop(crop)?;

    let (crop_width, crop_height) =
        crop.extent(f64::from(surface.width()), f64::from(surface.height()));
    let width = scaled_extent("width", crop_width, multiplier)?;
    let height = scaled_extent("height", crop_height, multiplier)?;
    let viewport = offscreen_viewport(&surface.viewport_transform(), multiplier, crop.offset());

    // Allocate before touching the surface so a failure leaves it untouched.
    let target = platform.allocate_target(width, height)?;
    debug!(
        "capturing surface {} at x{multiplier} into {width}x{height}",
        surface.id()
    );

    let mut guard = SnapshotGuard::enter(surface, viewport, target);
    guard.render_all(objects)?;
    Ok(guard.finish())
}

/// Export a whole surface as a pixel buffer.
pub fn export_pixels(
    platform: &Platform,
    surface: &mut RenderSurface,
    objects: &ObjectStore,
    options: &ExportOptions,
) -> Result<PixelBuffer> {
    options.validate()?;
    let retina = if options.enable_retina_scaling {
        surface.retina_scaling()
    } else {
        1.0
    };
    let multiplier = options.multiplier() * retina;

    let target = capture_render_target(platform, surface, objects, multiplier, &options.crop())?;
    platform.read_pixels(&target, 0, 0, target.width(), target.height())
}

/// The standard [`SurfaceExporter`]: snapshot, then read back every pixel.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotExporter;

impl SurfaceExporter for SnapshotExporter {
    fn export_pixels(
        &self,
        platform: &Platform,
        surface: &mut RenderSurface,
        objects: &ObjectStore,
        options: &ExportOptions,
    ) -> Result<PixelBuffer> {
        export_pixels(platform, surface, objects, options)
    }
}

impl RenderSurface {
    /// Off-screen render helper, reusable for other export formats.
    pub fn capture_render_target(
        &mut self,
        platform: &Platform,
        objects: &ObjectStore,
        multiplier: f64,
        crop: &CropWindow,
    ) -> Result<RenderTarget> {
        capture_render_target(platform, self, objects, multiplier, crop)
    }

    /// Export through the platform's installed surface exporter.
    pub fn export_pixels(
        &mut self,
        platform: &Platform,
        objects: &ObjectStore,
        options: &ExportOptions,
    ) -> Result<PixelBuffer> {
        platform.export_surface(self, objects, options)
    }
}
