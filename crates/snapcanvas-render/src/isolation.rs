//! Single-object export.
//!
//! The object is measured under its own transform, moved into a disposable
//! scratch surface sized to its bounds, exported through the platform's
//! surface exporter and then handed back to its original surface with its
//! transform restored. [`IsolationGuard`] performs the hand-back and the
//! scratch teardown on every exit path.

use log::debug;
use snapcanvas_core::{
    ObjectId, ObjectStore, OriginX, OriginY, Point, SceneObject, SurfaceId, TransformRecord,
};

use crate::error::{ExportError, Result};
use crate::options::ExportOptions;
use crate::pixels::PixelBuffer;
use crate::platform::Platform;
use crate::surface::{RenderSurface, SurfaceConfig};

/// Restores an object and tears down its scratch surface when dropped.
struct IsolationGuard<'a> {
    objects: &'a mut ObjectStore,
    object_id: ObjectId,
    record: TransformRecord,
    original_owner: Option<SurfaceId>,
    scratch: Option<RenderSurface>,
}

impl IsolationGuard<'_> {
    fn object_mut(&mut self) -> Result<&mut SceneObject> {
        self.objects
            .get_mut(&self.object_id)
            .ok_or(ExportError::UnknownObject(self.object_id))
    }
}

impl Drop for IsolationGuard<'_> {
    fn drop(&mut self) {
        if let Some(object) = self.objects.get_mut(&self.object_id) {
            object.restore(&self.record);
            object.set_owner(self.original_owner);
        }
        // Empty the scratch list first so teardown never reaches the object.
        if let Some(mut scratch) = self.scratch.take() {
            scratch.clear();
            scratch.dispose(self.objects);
        }
    }
}

fn scratch_extent(name: &str, extent: f64) -> Result<u32> {
    let rounded = extent.round();
    if !rounded.is_finite() || rounded < 1.0 || rounded > f64::from(u32::MAX) {
        return Err(ExportError::InvalidOptions(format!(
            "object {name} of {extent} cannot be exported"
        )));
    }
    Ok(rounded as u32)
}

/// Export a single object, isolated from the rest of its scene.
///
/// Whatever the outcome, the object ends up attached to its original surface
/// (or to none) with its transform and stroke width unchanged.
pub fn export_object_pixels(
    platform: &Platform,
    objects: &mut ObjectStore,
    object_id: ObjectId,
    options: &ExportOptions,
) -> Result<PixelBuffer> {
    options.validate()?;
    let (record, original_owner) = {
        let object = objects
            .get(&object_id)
            .ok_or(ExportError::UnknownObject(object_id))?;
        (object.save_transform(), object.owner())
    };

    let mut guard = IsolationGuard {
        objects,
        object_id,
        record,
        original_owner,
        scratch: None,
    };

    let bounds = {
        let object = guard.object_mut()?;
        if options.without_transform {
            object.reset_transform();
        }
        if let Some(fixed) = options.fixed_length {
            let length = object.scaled_width().max(object.scaled_height());
            if !(length > 0.0 && length.is_finite()) {
                return Err(ExportError::InvalidOptions(format!(
                    "object {object_id} has no extent to normalize"
                )));
            }
            let ratio = fixed / length;
            object.transform.scale_x *= ratio;
            object.transform.scale_y *= ratio;
        }
        if let Some(stroke_width) = options.fixed_stroke_width {
            object.stroke_width = stroke_width;
        }
        object.bounding_rect()
    };

    let (width, height) = match options.fixed_length {
        Some(fixed) => {
            let side = scratch_extent("length", fixed)?;
            (side, side)
        }
        None => (
            scratch_extent("width", bounds.width())?,
            scratch_extent("height", bounds.height())?,
        ),
    };

    let config = SurfaceConfig {
        width,
        height,
        background_color: Some(options.background()),
        interactive: false,
        enable_retina_scaling: options.enable_retina_scaling,
        device_pixel_ratio: None,
        render_on_add_remove: false,
        skip_offscreen: false,
    };
    let scratch = guard.scratch.insert(RenderSurface::new(config, platform)?);
    debug!(
        "isolating object {object_id} in {width}x{height} scratch surface {}",
        scratch.id()
    );

    let object = guard
        .objects
        .get_mut(&object_id)
        .ok_or(ExportError::UnknownObject(object_id))?;
    object.detach();
    scratch.add(object);

    let (w, h) = (f64::from(width), f64::from(height));
    object.set_position_by_origin(
        Point::new(w / 2.0, h / 2.0),
        OriginX::Center,
        OriginY::Center,
    );
    let center = object.center_point();
    scratch.absolute_pan(Point::new(center.x - w / 2.0, center.y - h / 2.0));

    platform.export_surface(scratch, &*guard.objects, options)
}
