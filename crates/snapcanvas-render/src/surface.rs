use std::fmt;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use snapcanvas_core::spatial::CullingIndex;
use snapcanvas_core::{Affine, BBox, ObjectId, ObjectStore, Point, Rgba, SceneObject, SurfaceId};
use uuid::Uuid;

use crate::error::Result;
use crate::paint;
use crate::platform::Platform;
use crate::target::{RenderTarget, TargetId};
use crate::viewport::Viewport;

/// Creation settings for a [`RenderSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub background_color: Option<Rgba>,
    pub interactive: bool,
    pub enable_retina_scaling: bool,
    /// Falls back to the platform's ratio when unset.
    pub device_pixel_ratio: Option<f64>,
    /// Re-render whenever an object is added or removed.
    pub render_on_add_remove: bool,
    /// Skip objects outside the viewport boundaries during a render pass.
    pub skip_offscreen: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 150,
            background_color: None,
            interactive: true,
            enable_retina_scaling: true,
            device_pixel_ratio: None,
            render_on_add_remove: true,
            skip_offscreen: true,
        }
    }
}

impl SurfaceConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_background(mut self, color: Rgba) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = Some(ratio);
        self
    }
}

/// Observable state that an export must leave untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceState {
    pub width: u32,
    pub height: u32,
    pub viewport: Affine,
    pub target: TargetId,
    pub interactive: bool,
    pub viewport_bounds: BBox,
}

/// A mutable rendering surface holding an ordered list of attached objects.
///
/// `width`/`height` always match the render target's pixel size outside an
/// export in progress.
pub struct RenderSurface {
    id: SurfaceId,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) target: RenderTarget,
    pub(crate) viewport: Viewport,
    pub(crate) interactive: bool,
    objects: Vec<ObjectId>,
    background_color: Option<Rgba>,
    enable_retina_scaling: bool,
    device_pixel_ratio: f64,
    render_on_add_remove: bool,
    skip_offscreen: bool,
    active_object: Option<ObjectId>,
    viewport_bounds: BBox,
}

impl RenderSurface {
    pub fn new(config: SurfaceConfig, platform: &Platform) -> Result<Self> {
        let target = platform.allocate_target(config.width, config.height)?;
        let mut surface = Self {
            id: Uuid::new_v4(),
            width: target.width(),
            height: target.height(),
            target,
            viewport: Viewport::new(),
            interactive: config.interactive,
            objects: Vec::new(),
            background_color: config.background_color,
            enable_retina_scaling: config.enable_retina_scaling,
            device_pixel_ratio: config
                .device_pixel_ratio
                .unwrap_or_else(|| platform.device_pixel_ratio()),
            render_on_add_remove: config.render_on_add_remove,
            skip_offscreen: config.skip_offscreen,
            active_object: None,
            viewport_bounds: BBox::new(Point::new(0.0, 0.0), Point::new(0.0, 0.0)),
        };
        surface.calc_viewport_boundaries();
        debug!(
            "created surface {} ({}x{})",
            surface.id, surface.width, surface.height
        );
        Ok(surface)
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn background_color(&self) -> Option<Rgba> {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Option<Rgba>) {
        self.background_color = color;
    }

    pub fn renders_on_add_remove(&self) -> bool {
        self.render_on_add_remove
    }

    pub fn state(&self) -> SurfaceState {
        SurfaceState {
            width: self.width,
            height: self.height,
            viewport: self.viewport.transform(),
            target: self.target.id(),
            interactive: self.interactive,
            viewport_bounds: self.viewport_bounds,
        }
    }

    // ── Viewport ─────────────────────────────────────────────────────

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom()
    }

    pub fn viewport_transform(&self) -> Affine {
        self.viewport.transform()
    }

    pub fn set_viewport_transform(&mut self, transform: Affine) {
        self.viewport.set_transform(transform);
        self.calc_viewport_boundaries();
    }

    pub fn absolute_pan(&mut self, point: Point) {
        self.viewport.absolute_pan(point);
        self.calc_viewport_boundaries();
    }

    pub fn relative_pan(&mut self, dx: f64, dy: f64) {
        self.viewport.relative_pan(dx, dy);
        self.calc_viewport_boundaries();
    }

    pub fn zoom_to_point(&mut self, screen: Point, value: f64) {
        self.viewport.zoom_to_point(screen, value);
        self.calc_viewport_boundaries();
    }

    pub fn viewport_bounds(&self) -> BBox {
        self.viewport_bounds
    }

    /// Refresh the cached scene-space rectangle covered by the target.
    pub fn calc_viewport_boundaries(&mut self) {
        match self
            .viewport
            .visible_bounds(f64::from(self.width), f64::from(self.height))
        {
            Some(bounds) => self.viewport_bounds = bounds,
            None => {
                warn!("surface {} has a singular viewport transform", self.id);
                self.viewport_bounds = BBox::new(Point::new(0.0, 0.0), Point::new(0.0, 0.0));
            }
        }
    }

    /// Device pixel ratio applied by retina-scaled exports.
    pub fn retina_scaling(&self) -> f64 {
        if self.enable_retina_scaling && self.device_pixel_ratio != 1.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    // ── Objects ──────────────────────────────────────────────────────

    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains(id)
    }

    /// Append `object` on top and point its owner at this surface.
    pub fn add(&mut self, object: &mut SceneObject) {
        if !self.objects.contains(&object.id) {
            self.objects.push(object.id);
        }
        object.attach(self.id);
    }

    /// Returns `false` if the object was not on this surface.
    pub fn remove(&mut self, object: &mut SceneObject) -> bool {
        let before = self.objects.len();
        self.objects.retain(|id| *id != object.id);
        if object.owner() == Some(self.id) {
            object.detach();
        }
        if self.active_object == Some(object.id) {
            self.active_object = None;
        }
        self.objects.len() != before
    }

    /// Forget every attached object id without touching the objects.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.active_object = None;
    }

    pub fn active_object(&self) -> Option<ObjectId> {
        self.active_object
    }

    pub fn set_active_object(&mut self, id: Option<ObjectId>) {
        self.active_object = id.filter(|id| self.objects.contains(id));
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Objects the next render pass will paint, in z-order.
    pub fn visible_objects(&self, store: &ObjectStore) -> Vec<ObjectId> {
        let candidates = self
            .objects
            .iter()
            .filter(|id| store.get(id).is_some_and(|o| o.visible));

        if !self.skip_offscreen {
            return candidates.copied().collect();
        }

        let index = CullingIndex::from_objects(candidates.clone().filter_map(|id| store.get(id)));
        let on_screen = index.visible_in(&self.viewport_bounds);

        candidates
            .filter(|id| {
                let keep = on_screen.contains(*id);
                if !keep {
                    trace!("culling offscreen object {id}");
                }
                keep
            })
            .copied()
            .collect()
    }

    /// One full render pass into the current target.
    pub fn render_all(&mut self, store: &ObjectStore) -> Result<()> {
        let visible = self.visible_objects(store);
        let vpt = self.viewport.transform();
        self.target
            .clear(self.background_color.unwrap_or(Rgba::TRANSPARENT));

        let pixmap = self.target.pixmap_mut();
        for id in &visible {
            if let Some(object) = store.get(id) {
                paint::draw_object(pixmap, object, &vpt)?;
            }
        }

        if self.interactive {
            if let Some(active) = self.active_object.and_then(|id| store.get(&id)) {
                paint::draw_controls(pixmap, active, &vpt);
            }
        }
        trace!(
            "rendered {} of {} objects on surface {} at {}x{}",
            visible.len(),
            self.objects.len(),
            self.id,
            self.width,
            self.height
        );
        Ok(())
    }

    /// Tear the surface down, releasing its render target.
    ///
    /// Objects still listed here lose their owner reference; they are not
    /// destroyed.
    pub fn dispose(self, store: &mut ObjectStore) {
        for id in &self.objects {
            if let Some(object) = store.get_mut(id) {
                if object.owner() == Some(self.id) {
                    object.detach();
                }
            }
        }
        debug!(
            "disposed surface {} with {} attached objects",
            self.id,
            self.objects.len()
        );
    }
}

impl fmt::Debug for RenderSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSurface")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("target", &self.target)
            .field("viewport", &self.viewport)
            .field("interactive", &self.interactive)
            .field("objects", &self.objects.len())
            .finish()
    }
}
