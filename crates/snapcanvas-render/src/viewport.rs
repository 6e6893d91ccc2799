use serde::{Deserialize, Serialize};
use snapcanvas_core::{Affine, BBox, Point};

/// Pan/zoom state of a render surface: maps scene coordinates to
/// target pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    transform: Affine,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transform(transform: Affine) -> Self {
        Self { transform }
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    pub fn zoom(&self) -> f64 {
        self.transform.scale_x()
    }

    /// Pan so that scene point `point` sits at the top-left pixel.
    pub fn absolute_pan(&mut self, point: Point) {
        self.transform.0[4] = -point.x;
        self.transform.0[5] = -point.y;
    }

    /// Pan by a delta in screen pixels.
    pub fn relative_pan(&mut self, dx: f64, dy: f64) {
        let current = Point::new(self.transform.0[4], self.transform.0[5]);
        self.absolute_pan(Point::new(-dx - current.x, -dy - current.y));
    }

    /// Zoom to `value` keeping the screen position `screen` fixed.
    pub fn zoom_to_point(&mut self, screen: Point, value: f64) {
        let Some(scene) = self.screen_to_scene(&screen) else {
            return;
        };
        let value = value.max(0.001).min(1_000_000.0);
        self.transform.0[0] = value;
        self.transform.0[3] = value;
        let after = self.scene_to_screen(&scene);
        self.transform.0[4] += screen.x - after.x;
        self.transform.0[5] += screen.y - after.y;
    }

    pub fn scene_to_screen(&self, p: &Point) -> Point {
        self.transform.apply(p)
    }

    /// `None` when the transform is singular.
    pub fn screen_to_scene(&self, p: &Point) -> Option<Point> {
        self.transform.invert().map(|inv| inv.apply(p))
    }

    /// Scene-space rectangle visible in a `width` x `height` target.
    pub fn visible_bounds(&self, width: f64, height: f64) -> Option<BBox> {
        let inv = self.transform.invert()?;
        let corners = [
            inv.apply(&Point::new(0.0, 0.0)),
            inv.apply(&Point::new(width, 0.0)),
            inv.apply(&Point::new(0.0, height)),
            inv.apply(&Point::new(width, height)),
        ];
        BBox::from_points(&corners)
    }
}
