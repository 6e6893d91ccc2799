use serde::{Deserialize, Serialize};

/// A 2D point in scene coordinates (pixels at zoom 1).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Rotate this point around `origin` by `degrees` (clockwise in screen space).
    pub fn rotate_around(&self, origin: &Point, degrees: f64) -> Self {
        let rad = degrees.to_radians();
        let (sin_r, cos_r) = rad.sin_cos();
        let dx = self.x - origin.x;
        let dy = self.y - origin.y;
        Point::new(
            dx * cos_r - dy * sin_r + origin.x,
            dx * sin_r + dy * cos_r + origin.y,
        )
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Point::new(x, y), Point::new(x + width, y + height))
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn is_finite(&self) -> bool {
        self.min.x.is_finite()
            && self.min.y.is_finite()
            && self.max.x.is_finite()
            && self.max.y.is_finite()
    }
}

/// A 2D affine matrix in canvas order: `[a, b, c, d, e, f]`
/// = scaleX, skewY, skewX, scaleY, translateX, translateY.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine(pub [f64; 6]);

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self([a, b, c, d, e, f])
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, x, y])
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    pub fn rotate(degrees: f64) -> Self {
        let (sin_r, cos_r) = degrees.to_radians().sin_cos();
        Self([cos_r, sin_r, -sin_r, cos_r, 0.0, 0.0])
    }

    pub fn skew_x(degrees: f64) -> Self {
        Self([1.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0])
    }

    pub fn skew_y(degrees: f64) -> Self {
        Self([1.0, degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0])
    }

    pub fn scale_x(&self) -> f64 {
        self.0[0]
    }

    pub fn translate_x(&self) -> f64 {
        self.0[4]
    }

    pub fn translate_y(&self) -> f64 {
        self.0[5]
    }

    /// `self · other`: `other` is applied first.
    pub fn multiply(&self, other: &Affine) -> Affine {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Affine([
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * e2 + c1 * f2 + e1,
            b1 * e2 + d1 * f2 + f1,
        ])
    }

    pub fn apply(&self, p: &Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Returns `None` for a singular matrix.
    pub fn invert(&self) -> Option<Affine> {
        let [a, b, c, d, e, f] = self.0;
        let det = a * d - b * c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Affine([
            d / det,
            -b / det,
            -c / det,
            a / det,
            (c * f - d * e) / det,
            (b * e - a * f) / det,
        ]))
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// The sub-rectangle of a source to export, in unscaled coordinates.
///
/// Unset (or zero) extents fall back to the full source extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropWindow {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl CropWindow {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left: Some(left),
            top: Some(top),
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn offset(&self) -> Point {
        Point::new(self.left.unwrap_or(0.0), self.top.unwrap_or(0.0))
    }

    /// Resolve the crop extent against a full `(width, height)` source.
    pub fn extent(&self, full_width: f64, full_height: f64) -> (f64, f64) {
        let pick = |v: Option<f64>, full: f64| match v {
            Some(v) if v != 0.0 => v,
            _ => full,
        };
        (pick(self.width, full_width), pick(self.height, full_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rotate_around() {
        let p = Point::new(10.0, 0.0).rotate_around(&Point::new(0.0, 0.0), 90.0);
        assert!(close(p.x, 0.0));
        assert!(close(p.y, 10.0));
    }

    #[test]
    fn test_affine_multiply_applies_right_first() {
        let m = Affine::translate(10.0, 0.0).multiply(&Affine::scale(2.0, 2.0));
        let p = m.apply(&Point::new(1.0, 1.0));
        assert!(close(p.x, 12.0));
        assert!(close(p.y, 2.0));
    }

    #[test]
    fn test_affine_invert() {
        let m = Affine::new(2.0, 0.0, 0.0, 4.0, 10.0, -6.0);
        let inv = m.invert().unwrap();
        let p = inv.apply(&m.apply(&Point::new(3.0, 7.0)));
        assert!(close(p.x, 3.0));
        assert!(close(p.y, 7.0));
        assert!(Affine::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_crop_extent_falls_back_on_zero() {
        let crop = CropWindow {
            width: Some(0.0),
            height: Some(40.0),
            ..Default::default()
        };
        assert_eq!(crop.extent(300.0, 200.0), (300.0, 40.0));
        assert_eq!(CropWindow::default().offset(), Point::new(0.0, 0.0));
    }
}
