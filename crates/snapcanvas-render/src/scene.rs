use std::collections::HashMap;

use log::{debug, info};
use snapcanvas_core::{CropWindow, ObjectId, ObjectStore, SceneObject, SurfaceId};

use crate::error::{ExportError, Result};
use crate::isolation;
use crate::options::ExportOptions;
use crate::pixels::PixelBuffer;
use crate::platform::Platform;
use crate::surface::{RenderSurface, SurfaceConfig};
use crate::target::RenderTarget;

/// Owns the object arena, every live surface and the capability registry.
#[derive(Debug, Default)]
pub struct Scene {
    objects: ObjectStore,
    surfaces: HashMap<SurfaceId, RenderSurface>,
    platform: Platform,
}

impl Scene {
    pub fn new(platform: Platform) -> Self {
        Self {
            objects: ObjectStore::new(),
            surfaces: HashMap::new(),
            platform,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut Platform {
        &mut self.platform
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn object(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    pub fn surface(&self, id: &SurfaceId) -> Option<&RenderSurface> {
        self.surfaces.get(id)
    }

    pub fn surface_mut(&mut self, id: &SurfaceId) -> Option<&mut RenderSurface> {
        self.surfaces.get_mut(id)
    }

    pub fn add_surface(&mut self, config: SurfaceConfig) -> Result<SurfaceId> {
        let surface = RenderSurface::new(config, &self.platform)?;
        let id = surface.id();
        self.surfaces.insert(id, surface);
        Ok(id)
    }

    /// Store an object without attaching it to any surface.
    pub fn insert_object(&mut self, object: SceneObject) -> ObjectId {
        self.objects.add(object)
    }

    /// Store `object` and attach it on top of `surface`.
    pub fn add_object(&mut self, surface: SurfaceId, object: SceneObject) -> Result<ObjectId> {
        if !self.surfaces.contains_key(&surface) {
            return Err(ExportError::UnknownSurface(surface));
        }
        let id = self.objects.add(object);
        self.attach_object(surface, id)?;
        Ok(id)
    }

    /// Move an already stored object onto `surface`, leaving its previous
    /// surface if it had one.
    pub fn attach_object(&mut self, surface: SurfaceId, id: ObjectId) -> Result<()> {
        let previous = self
            .objects
            .get(&id)
            .ok_or(ExportError::UnknownObject(id))?
            .owner();
        if let Some(previous) = previous.filter(|p| *p != surface) {
            self.remove_object(previous, id)?;
        }

        let target = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ExportError::UnknownSurface(surface))?;
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(ExportError::UnknownObject(id))?;
        target.add(object);
        if target.renders_on_add_remove() {
            target.render_all(&self.objects)?;
        }
        Ok(())
    }

    /// Take `id` off `surface`. The object stays in the store.
    pub fn remove_object(&mut self, surface: SurfaceId, id: ObjectId) -> Result<bool> {
        let target = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ExportError::UnknownSurface(surface))?;
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(ExportError::UnknownObject(id))?;
        let removed = target.remove(object);
        if removed && target.renders_on_add_remove() {
            target.render_all(&self.objects)?;
        }
        Ok(removed)
    }

    pub fn render(&mut self, surface: SurfaceId) -> Result<()> {
        let target = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ExportError::UnknownSurface(surface))?;
        target.render_all(&self.objects)
    }

    pub fn capture_render_target(
        &mut self,
        surface: SurfaceId,
        multiplier: f64,
        crop: &CropWindow,
    ) -> Result<RenderTarget> {
        let target = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ExportError::UnknownSurface(surface))?;
        target.capture_render_target(&self.platform, &self.objects, multiplier, crop)
    }

    pub fn export_surface_pixels(
        &mut self,
        surface: SurfaceId,
        options: &ExportOptions,
    ) -> Result<PixelBuffer> {
        let target = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ExportError::UnknownSurface(surface))?;
        let buffer = target.export_pixels(&self.platform, &self.objects, options)?;
        info!(
            "exported surface {surface} as {}x{} pixels",
            buffer.width(),
            buffer.height()
        );
        Ok(buffer)
    }

    pub fn export_object_pixels(
        &mut self,
        object: ObjectId,
        options: &ExportOptions,
    ) -> Result<PixelBuffer> {
        let buffer =
            isolation::export_object_pixels(&self.platform, &mut self.objects, object, options)?;
        info!(
            "exported object {object} as {}x{} pixels",
            buffer.width(),
            buffer.height()
        );
        Ok(buffer)
    }

    /// Drop a surface. Its objects stay in the store, unattached.
    pub fn dispose_surface(&mut self, surface: SurfaceId) -> Result<()> {
        let removed = self
            .surfaces
            .remove(&surface)
            .ok_or(ExportError::UnknownSurface(surface))?;
        removed.dispose(&mut self.objects);
        debug!("scene now holds {} surfaces", self.surfaces.len());
        Ok(())
    }

    /// Remove an object from the store, detaching it first.
    pub fn delete_object(&mut self, id: ObjectId) -> Result<SceneObject> {
        let owner = self
            .objects
            .get(&id)
            .ok_or(ExportError::UnknownObject(id))?
            .owner();
        if let Some(owner) = owner {
            if self.surfaces.contains_key(&owner) {
                self.remove_object(owner, id)?;
            }
        }
        self.objects
            .remove(&id)
            .ok_or(ExportError::UnknownObject(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{PixelReadback, PixmapAllocator};
    use snapcanvas_core::Rgba;
    use uuid::Uuid;

    const RED: Rgba = Rgba::rgb(255, 0, 0);
    const GREEN: Rgba = Rgba::rgb(0, 255, 0);

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn scene_with_two_rects() -> (Scene, SurfaceId, ObjectId, ObjectId) {
        init_logging();
        let mut scene = Scene::default();
        let surface = scene
            .add_surface(SurfaceConfig::new(200, 100).with_background(Rgba::WHITE))
            .unwrap();
        let red = scene
            .add_object(surface, SceneObject::rect(50.0, 50.0).with_fill(RED))
            .unwrap();
        let green = scene
            .add_object(
                surface,
                SceneObject::rect(50.0, 50.0)
                    .with_position(100.0, 25.0)
                    .with_fill(GREEN),
            )
            .unwrap();
        (scene, surface, red, green)
    }

    #[test]
    fn test_add_object_renders_live_target() {
        let (scene, surface, red, _) = scene_with_two_rects();
        let live = scene.surface(&surface).unwrap();
        assert_eq!(scene.object(&red).unwrap().owner(), Some(surface));

        let readback = crate::target::PixmapReadback;
        let buf = readback.read_pixels(live.target(), 0, 0, 200, 100).unwrap();
        assert_eq!(buf.pixel(25, 25), Some(RED));
        assert_eq!(buf.pixel(125, 50), Some(GREEN));
        assert_eq!(buf.pixel(190, 90), Some(Rgba::WHITE));
    }

    #[test]
    fn test_surface_and_object_export_end_to_end() {
        let (mut scene, surface, _, green) = scene_with_two_rects();
        let before = scene.surface(&surface).unwrap().state();

        let whole = scene
            .export_surface_pixels(surface, &ExportOptions::new().with_multiplier(2.0))
            .unwrap();
        assert_eq!((whole.width(), whole.height()), (400, 200));
        assert_eq!(whole.pixel(50, 50), Some(RED));
        assert_eq!(scene.surface(&surface).unwrap().state(), before);

        let single = scene
            .export_object_pixels(green, &ExportOptions::new())
            .unwrap();
        assert_eq!((single.width(), single.height()), (50, 50));
        assert_eq!(single.pixel(25, 25), Some(GREEN));
        assert_eq!(scene.object(&green).unwrap().owner(), Some(surface));
        assert!(scene.surface(&surface).unwrap().contains(&green));
    }

    #[test]
    fn test_capture_render_target_is_independent_of_surface() {
        let (mut scene, surface, _, _) = scene_with_two_rects();
        let live_id = scene.surface(&surface).unwrap().target().id();
        let target = scene
            .capture_render_target(surface, 0.5, &CropWindow::default())
            .unwrap();
        assert_ne!(target.id(), live_id);
        assert_eq!((target.width(), target.height()), (100, 50));
    }

    #[test]
    fn test_attach_moves_object_between_surfaces() {
        let (mut scene, first, red, _) = scene_with_two_rects();
        let second = scene.add_surface(SurfaceConfig::new(50, 50)).unwrap();
        scene.attach_object(second, red).unwrap();

        assert_eq!(scene.object(&red).unwrap().owner(), Some(second));
        assert!(!scene.surface(&first).unwrap().contains(&red));
        assert!(scene.surface(&second).unwrap().contains(&red));
    }

    #[test]
    fn test_dispose_surface_keeps_objects() {
        let (mut scene, surface, red, green) = scene_with_two_rects();
        scene.dispose_surface(surface).unwrap();
        assert!(scene.surface(&surface).is_none());
        assert!(scene.object(&red).unwrap().owner().is_none());
        assert!(scene.object(&green).unwrap().owner().is_none());
        assert!(matches!(
            scene.render(surface),
            Err(ExportError::UnknownSurface(id)) if id == surface
        ));
    }

    #[test]
    fn test_delete_object_detaches_first() {
        let (mut scene, surface, red, _) = scene_with_two_rects();
        let removed = scene.delete_object(red).unwrap();
        assert!(removed.owner().is_none());
        assert!(!scene.surface(&surface).unwrap().contains(&red));
        assert!(scene.object(&red).is_none());
    }

    #[test]
    fn test_missing_allocator_is_reported() {
        init_logging();
        let mut scene = Scene::new(Platform::empty());
        assert!(matches!(
            scene.add_surface(SurfaceConfig::new(10, 10)),
            Err(ExportError::NotInstalled(_))
        ));
        scene.platform_mut().install_allocator(PixmapAllocator).unwrap();
        let surface = scene.add_surface(SurfaceConfig::new(10, 10)).unwrap();
        assert!(matches!(
            scene.export_surface_pixels(surface, &ExportOptions::new()),
            Err(ExportError::NotInstalled(_))
        ));
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let mut scene = Scene::default();
        let id = Uuid::new_v4();
        assert!(matches!(
            scene.add_object(id, SceneObject::rect(1.0, 1.0)),
            Err(ExportError::UnknownSurface(_))
        ));
        assert!(scene.objects().is_empty());
        assert!(matches!(
            scene.export_object_pixels(id, &ExportOptions::new()),
            Err(ExportError::UnknownObject(_))
        ));
    }
}
