//! Install-once registry for the host extension points that export relies on.

use std::fmt;

use log::{debug, warn};
use snapcanvas_core::ObjectStore;

use crate::error::{Capability, ExportError, Result};
use crate::options::ExportOptions;
use crate::pixels::PixelBuffer;
use crate::snapshot::SnapshotExporter;
use crate::surface::RenderSurface;
use crate::target::{
    PixelReadback, PixmapAllocator, PixmapReadback, RenderTarget, TargetAllocator,
};

/// Exports a whole surface as pixels.
pub trait SurfaceExporter {
    fn export_pixels(
        &self,
        platform: &Platform,
        surface: &mut RenderSurface,
        objects: &ObjectStore,
        options: &ExportOptions,
    ) -> Result<PixelBuffer>;
}

/// Capability registry. The first installation of each capability wins.
pub struct Platform {
    readback: Option<Box<dyn PixelReadback>>,
    allocator: Option<Box<dyn TargetAllocator>>,
    surface_export: Option<Box<dyn SurfaceExporter>>,
    device_pixel_ratio: f64,
}

impl Default for Platform {
    /// A registry with the pixmap allocator, pixmap read-back and the
    /// snapshot exporter installed.
    fn default() -> Self {
        Self {
            readback: Some(Box::new(PixmapReadback)),
            allocator: Some(Box::new(PixmapAllocator)),
            surface_export: Some(Box::new(SnapshotExporter)),
            device_pixel_ratio: 1.0,
        }
    }
}

fn install<T: ?Sized>(
    slot: &mut Option<Box<T>>,
    capability: Capability,
    value: Box<T>,
) -> Result<()> {
    if slot.is_some() {
        warn!("{capability} is already defined");
        return Err(ExportError::AlreadyInstalled(capability));
    }
    debug!("installed {capability}");
    *slot = Some(value);
    Ok(())
}

impl Platform {
    /// A registry with nothing installed.
    pub fn empty() -> Self {
        Self {
            readback: None,
            allocator: None,
            surface_export: None,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn is_installed(&self, capability: Capability) -> bool {
        match capability {
            Capability::PixelReadback => self.readback.is_some(),
            Capability::TargetAllocation => self.allocator.is_some(),
            Capability::SurfaceExport => self.surface_export.is_some(),
        }
    }

    // ── Installation ─────────────────────────────────────────────────
    //
    // A second installation is non-fatal: it is logged, the existing
    // implementation stays, and `AlreadyInstalled` is returned.

    pub fn install_readback(&mut self, readback: impl PixelReadback + 'static) -> Result<()> {
        let boxed: Box<dyn PixelReadback> = Box::new(readback);
        install(&mut self.readback, Capability::PixelReadback, boxed)
    }

    pub fn install_allocator(&mut self, allocator: impl TargetAllocator + 'static) -> Result<()> {
        let boxed: Box<dyn TargetAllocator> = Box::new(allocator);
        install(&mut self.allocator, Capability::TargetAllocation, boxed)
    }

    pub fn install_surface_exporter(
        &mut self,
        exporter: impl SurfaceExporter + 'static,
    ) -> Result<()> {
        let boxed: Box<dyn SurfaceExporter> = Box::new(exporter);
        install(&mut self.surface_export, Capability::SurfaceExport, boxed)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub fn allocate_target(&self, width: u32, height: u32) -> Result<RenderTarget> {
        self.allocator
            .as_ref()
            .ok_or(ExportError::NotInstalled(Capability::TargetAllocation))?
            .allocate(width, height)
    }

    pub fn read_pixels(
        &self,
        target: &RenderTarget,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer> {
        self.readback
            .as_ref()
            .ok_or(ExportError::NotInstalled(Capability::PixelReadback))?
            .read_pixels(target, x, y, width, height)
    }

    pub fn export_surface(
        &self,
        surface: &mut RenderSurface,
        objects: &ObjectStore,
        options: &ExportOptions,
    ) -> Result<PixelBuffer> {
        self.surface_export
            .as_ref()
            .ok_or(ExportError::NotInstalled(Capability::SurfaceExport))?
            .export_pixels(self, surface, objects, options)
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("readback", &self.readback.is_some())
            .field("allocator", &self.allocator.is_some())
            .field("surface_export", &self.surface_export.is_some())
            .field("device_pixel_ratio", &self.device_pixel_ratio)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapcanvas_core::Rgba;

    struct SolidReadback(Rgba);

    impl PixelReadback for SolidReadback {
        fn read_pixels(
            &self,
            _target: &RenderTarget,
            _x: i64,
            _y: i64,
            width: u32,
            height: u32,
        ) -> Result<PixelBuffer> {
            let data = self.0.to_array().repeat(width as usize * height as usize);
            PixelBuffer::new(width, height, data)
                .ok_or_else(|| ExportError::RenderFailure("bad buffer".to_string()))
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_second_install_keeps_first() {
        init_logging();
        let mut platform = Platform::empty();
        platform
            .install_readback(SolidReadback(Rgba::rgb(1, 2, 3)))
            .unwrap();
        let second = platform.install_readback(SolidReadback(Rgba::rgb(9, 9, 9)));
        assert!(matches!(
            second,
            Err(ExportError::AlreadyInstalled(Capability::PixelReadback))
        ));

        let target = RenderTarget::new(2, 2).unwrap();
        let buf = platform.read_pixels(&target, 0, 0, 2, 2).unwrap();
        assert_eq!(buf.pixel(1, 1), Some(Rgba::rgb(1, 2, 3)));
    }

    #[test]
    fn test_defaults_are_installed_once() {
        init_logging();
        let mut platform = Platform::default();
        assert!(platform.install_allocator(PixmapAllocator).is_err());
        assert!(platform.install_surface_exporter(SnapshotExporter).is_err());
        assert!(platform.is_installed(Capability::SurfaceExport));
    }

    #[test]
    fn test_checks_are_independent_per_capability() {
        let mut platform = Platform::empty();
        platform.install_readback(PixmapReadback).unwrap();
        assert!(!platform.is_installed(Capability::TargetAllocation));
        platform.install_allocator(PixmapAllocator).unwrap();
        platform.install_surface_exporter(SnapshotExporter).unwrap();
    }

    #[test]
    fn test_missing_capability_is_reported() {
        let platform = Platform::empty();
        assert!(matches!(
            platform.allocate_target(1, 1),
            Err(ExportError::NotInstalled(Capability::TargetAllocation))
        ));
    }
}
