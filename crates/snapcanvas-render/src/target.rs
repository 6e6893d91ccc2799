//! Render targets plus the allocation and read-back primitives.

use std::fmt;

use log::debug;
use snapcanvas_core::Rgba;
use tiny_skia::{Color, Pixmap};
use uuid::Uuid;

use crate::error::{ExportError, Result};
use crate::pixels::PixelBuffer;

/// Unique render target identifier.
pub type TargetId = Uuid;

/// A pixel surface that render passes draw into.
pub struct RenderTarget {
    id: TargetId,
    pixmap: Pixmap,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ExportError::RenderFailure(format!("cannot allocate a {width}x{height} render target"))
        })?;
        Ok(Self {
            id: Uuid::new_v4(),
            pixmap,
        })
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixmap
            .fill(Color::from_rgba8(color.r, color.g, color.b, color.a));
    }
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Creates render targets.
pub trait TargetAllocator {
    fn allocate(&self, width: u32, height: u32) -> Result<RenderTarget>;
}

/// Reads rendered pixels back out of a target.
pub trait PixelReadback {
    /// Read the `width` x `height` window at `(x, y)`.
    fn read_pixels(
        &self,
        target: &RenderTarget,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer>;
}

/// Allocates CPU pixmaps.
#[derive(Debug, Default, Clone, Copy)]
pub struct PixmapAllocator;

impl TargetAllocator for PixmapAllocator {
    fn allocate(&self, width: u32, height: u32) -> Result<RenderTarget> {
        debug!("allocating {width}x{height} render target");
        RenderTarget::new(width, height)
    }
}

/// Reads pixmap pixels, un-premultiplying them.
///
/// Pixels outside the target read as transparent black.
#[derive(Debug, Default, Clone, Copy)]
pub struct PixmapReadback;

impl PixelReadback for PixmapReadback {
    fn read_pixels(
        &self,
        target: &RenderTarget,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer> {
        if width == 0 || height == 0 {
            return Err(ExportError::RenderFailure(format!(
                "cannot read an empty {width}x{height} pixel window"
            )));
        }

        let pixmap = target.pixmap();
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for row in 0..height as i64 {
            for col in 0..width as i64 {
                let (sx, sy) = (x + col, y + row);
                let inside = sx >= 0
                    && sy >= 0
                    && sx < i64::from(pixmap.width())
                    && sy < i64::from(pixmap.height());
                match inside.then(|| pixmap.pixel(sx as u32, sy as u32)).flatten() {
                    Some(px) => {
                        let c = px.demultiply();
                        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
                    }
                    None => data.extend_from_slice(&[0, 0, 0, 0]),
                }
            }
        }

        PixelBuffer::new(width, height, data).ok_or_else(|| {
            ExportError::RenderFailure("pixel read-back produced a short buffer".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sized_target_fails() {
        assert!(matches!(
            PixmapAllocator.allocate(0, 10),
            Err(ExportError::RenderFailure(_))
        ));
    }

    #[test]
    fn test_targets_have_distinct_ids() {
        let a = RenderTarget::new(1, 1).unwrap();
        let b = RenderTarget::new(1, 1).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_read_pixels_full_extent() {
        let mut target = PixmapAllocator.allocate(3, 2).unwrap();
        target.clear(Rgba::rgb(10, 20, 30));
        let buf = PixmapReadback.read_pixels(&target, 0, 0, 3, 2).unwrap();
        assert_eq!((buf.width(), buf.height()), (3, 2));
        assert_eq!(buf.pixel(2, 1), Some(Rgba::rgb(10, 20, 30)));
    }

    #[test]
    fn test_read_pixels_outside_is_transparent() {
        let mut target = PixmapAllocator.allocate(2, 2).unwrap();
        target.clear(Rgba::WHITE);
        let buf = PixmapReadback.read_pixels(&target, 1, 1, 2, 2).unwrap();
        assert_eq!(buf.pixel(0, 0), Some(Rgba::WHITE));
        assert_eq!(buf.pixel(1, 1), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_read_pixels_unpremultiplies() {
        let mut target = PixmapAllocator.allocate(1, 1).unwrap();
        target.clear(Rgba::new(255, 0, 0, 128));
        let buf = PixmapReadback.read_pixels(&target, 0, 0, 1, 1).unwrap();
        let px = buf.pixel(0, 0).unwrap();
        assert_eq!(px.a, 128);
        assert!(px.r >= 254);
    }

    #[test]
    fn test_empty_read_fails() {
        let target = PixmapAllocator.allocate(1, 1).unwrap();
        assert!(PixmapReadback.read_pixels(&target, 0, 0, 0, 1).is_err());
    }
}
