use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Rgba;
use crate::geometry::{Affine, BBox, Point};

/// Unique scene object identifier.
pub type ObjectId = Uuid;

/// Unique render surface identifier.
pub type SurfaceId = Uuid;

/// Horizontal anchor that `left` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

impl OriginX {
    fn offset(self) -> f64 {
        match self {
            OriginX::Left => -0.5,
            OriginX::Center => 0.0,
            OriginX::Right => 0.5,
        }
    }
}

/// Vertical anchor that `top` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

impl OriginY {
    fn offset(self) -> f64 {
        match self {
            OriginY::Top => -0.5,
            OriginY::Center => 0.0,
            OriginY::Bottom => 0.5,
        }
    }
}

/// Placement of an object in its surface's scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    pub left: f64,
    pub top: f64,
    pub origin_x: OriginX,
    pub origin_y: OriginY,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees around the object center.
    pub angle: f64,
    /// Skew angles in degrees.
    pub skew_x: f64,
    pub skew_y: f64,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

/// Saved transform state, restored after a temporary modification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub transform: ObjectTransform,
    pub stroke_width: f64,
}

/// The drawable outline of an object, in its own untransformed box
/// of `width` x `height` with the origin at the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect,
    Ellipse,
    Polygon(Vec<Point>),
}

/// A drawable entity attachable to one render surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub shape: Shape,
    pub width: f64,
    pub height: f64,
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub stroke_width: f64,
    pub visible: bool,
    pub transform: ObjectTransform,
    /// Surface this object is attached to. Describes attachment only.
    #[serde(skip)]
    owner: Option<SurfaceId>,
}

impl SceneObject {
    fn with_shape(shape: Shape, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape,
            width,
            height,
            fill: Some(Rgba::BLACK),
            stroke: None,
            stroke_width: 0.0,
            visible: true,
            transform: ObjectTransform::default(),
            owner: None,
        }
    }

    pub fn rect(width: f64, height: f64) -> Self {
        Self::with_shape(Shape::Rect, width, height)
    }

    pub fn ellipse(width: f64, height: f64) -> Self {
        Self::with_shape(Shape::Ellipse, width, height)
    }

    /// Build a polygon; points are shifted so the box starts at the origin.
    pub fn polygon(points: Vec<Point>) -> Self {
        match BBox::from_points(&points) {
            Some(bb) => {
                let shifted = points
                    .iter()
                    .map(|p| p.translate(-bb.min.x, -bb.min.y))
                    .collect();
                Self::with_shape(Shape::Polygon(shifted), bb.width(), bb.height())
            }
            None => Self::with_shape(Shape::Polygon(Vec::new()), 0.0, 0.0),
        }
    }

    pub fn with_position(mut self, left: f64, top: f64) -> Self {
        self.transform.left = left;
        self.transform.top = top;
        self
    }

    pub fn with_fill(mut self, fill: Rgba) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: Rgba, width: f64) -> Self {
        self.stroke = Some(stroke);
        self.stroke_width = width;
        self
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.transform.scale_x = scale_x;
        self.transform.scale_y = scale_y;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.transform.angle = angle;
        self
    }

    // ── Attachment ───────────────────────────────────────────────────

    pub fn owner(&self) -> Option<SurfaceId> {
        self.owner
    }

    pub fn attach(&mut self, surface: SurfaceId) {
        self.owner = Some(surface);
    }

    /// Clear the owner, returning the previous one.
    pub fn detach(&mut self) -> Option<SurfaceId> {
        self.owner.take()
    }

    pub fn set_owner(&mut self, owner: Option<SurfaceId>) {
        self.owner = owner;
    }

    // ── Dimensions ───────────────────────────────────────────────────

    /// Box size including the stroke, before any transform.
    pub fn non_transformed_dimensions(&self) -> Point {
        Point::new(
            self.width + self.stroke_width,
            self.height + self.stroke_width,
        )
    }

    /// Flip, scale and skew, without translation or rotation.
    pub fn dimension_matrix(&self) -> Affine {
        let t = &self.transform;
        let sx = if t.flip_x { -t.scale_x } else { t.scale_x };
        let sy = if t.flip_y { -t.scale_y } else { t.scale_y };
        let mut m = Affine::scale(sx, sy);
        if t.skew_x != 0.0 {
            m = m.multiply(&Affine::skew_x(t.skew_x));
        }
        if t.skew_y != 0.0 {
            m = m.multiply(&Affine::skew_y(t.skew_y));
        }
        m
    }

    fn box_corners(&self) -> [Point; 4] {
        let dim = self.non_transformed_dimensions();
        let (hw, hh) = (dim.x / 2.0, dim.y / 2.0);
        [
            Point::new(-hw, -hh),
            Point::new(hw, -hh),
            Point::new(hw, hh),
            Point::new(-hw, hh),
        ]
    }

    /// Box size after scale and skew (rotation excluded).
    pub fn transformed_dimensions(&self) -> Point {
        let m = self.dimension_matrix();
        let pts: Vec<Point> = self.box_corners().iter().map(|p| m.apply(p)).collect();
        match BBox::from_points(&pts) {
            Some(bb) => Point::new(bb.width(), bb.height()),
            None => Point::new(0.0, 0.0),
        }
    }

    pub fn scaled_width(&self) -> f64 {
        self.transformed_dimensions().x
    }

    pub fn scaled_height(&self) -> f64 {
        self.transformed_dimensions().y
    }

    // ── Origins ──────────────────────────────────────────────────────

    fn translate_to_given_origin(
        &self,
        point: Point,
        from: (OriginX, OriginY),
        to: (OriginX, OriginY),
    ) -> Point {
        let offset_x = to.0.offset() - from.0.offset();
        let offset_y = to.1.offset() - from.1.offset();
        if offset_x == 0.0 && offset_y == 0.0 {
            return point;
        }
        let dim = self.transformed_dimensions();
        Point::new(point.x + offset_x * dim.x, point.y + offset_y * dim.y)
    }

    /// Convert a point given at `(origin_x, origin_y)` to the object center.
    pub fn translate_to_center_point(
        &self,
        point: Point,
        origin_x: OriginX,
        origin_y: OriginY,
    ) -> Point {
        let p = self.translate_to_given_origin(
            point,
            (origin_x, origin_y),
            (OriginX::Center, OriginY::Center),
        );
        if self.transform.angle != 0.0 {
            p.rotate_around(&point, self.transform.angle)
        } else {
            p
        }
    }

    /// Convert the object center to the point at `(origin_x, origin_y)`.
    pub fn translate_to_origin_point(
        &self,
        center: Point,
        origin_x: OriginX,
        origin_y: OriginY,
    ) -> Point {
        let p = self.translate_to_given_origin(
            center,
            (OriginX::Center, OriginY::Center),
            (origin_x, origin_y),
        );
        if self.transform.angle != 0.0 {
            p.rotate_around(&center, self.transform.angle)
        } else {
            p
        }
    }

    pub fn center_point(&self) -> Point {
        let t = &self.transform;
        self.translate_to_center_point(Point::new(t.left, t.top), t.origin_x, t.origin_y)
    }

    /// Move the object so that its `(origin_x, origin_y)` anchor sits at `pos`.
    pub fn set_position_by_origin(&mut self, pos: Point, origin_x: OriginX, origin_y: OriginY) {
        let center = self.translate_to_center_point(pos, origin_x, origin_y);
        let (own_x, own_y) = (self.transform.origin_x, self.transform.origin_y);
        let position = self.translate_to_origin_point(center, own_x, own_y);
        self.transform.left = position.x;
        self.transform.top = position.y;
    }

    // ── Transform and bounds ─────────────────────────────────────────

    /// Object-to-scene matrix; the object box is centered on the origin.
    pub fn calc_transform_matrix(&self) -> Affine {
        let center = self.center_point();
        Affine::translate(center.x, center.y)
            .multiply(&Affine::rotate(self.transform.angle))
            .multiply(&self.dimension_matrix())
    }

    /// Axis-aligned bounds under the object's own transform only.
    pub fn bounding_rect(&self) -> BBox {
        let m = self.calc_transform_matrix();
        let pts: Vec<Point> = self.box_corners().iter().map(|p| m.apply(p)).collect();
        BBox::from_points(&pts).unwrap_or_else(|| {
            let center = self.center_point();
            BBox::new(center, center)
        })
    }

    pub fn save_transform(&self) -> TransformRecord {
        TransformRecord {
            transform: self.transform,
            stroke_width: self.stroke_width,
        }
    }

    /// Drop scale, rotation, skew and flips; the position is kept.
    pub fn reset_transform(&mut self) {
        let t = &mut self.transform;
        t.scale_x = 1.0;
        t.scale_y = 1.0;
        t.angle = 0.0;
        t.skew_x = 0.0;
        t.skew_y = 0.0;
        t.flip_x = false;
        t.flip_y = false;
    }

    pub fn restore(&mut self, record: &TransformRecord) {
        self.transform = record.transform;
        self.stroke_width = record.stroke_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_scaled_dimensions_include_stroke() {
        let obj = SceneObject::rect(100.0, 50.0)
            .with_stroke(Rgba::BLACK, 2.0)
            .with_scale(2.0, 3.0);
        assert!(close(obj.scaled_width(), 204.0));
        assert!(close(obj.scaled_height(), 156.0));
    }

    #[test]
    fn test_center_point_from_top_left_origin() {
        let obj = SceneObject::rect(100.0, 50.0).with_position(10.0, 20.0);
        let c = obj.center_point();
        assert!(close(c.x, 60.0));
        assert!(close(c.y, 45.0));
    }

    #[test]
    fn test_bounding_rect_of_rotated_object() {
        let obj = SceneObject::rect(100.0, 50.0).with_angle(90.0);
        let bb = obj.bounding_rect();
        assert!(close(bb.width(), 50.0));
        assert!(close(bb.height(), 100.0));
    }

    #[test]
    fn test_bounding_rect_unrotated_matches_position() {
        let obj = SceneObject::rect(40.0, 30.0).with_position(5.0, 7.0);
        let bb = obj.bounding_rect();
        assert!(close(bb.min.x, 5.0));
        assert!(close(bb.min.y, 7.0));
        assert!(close(bb.max.x, 45.0));
        assert!(close(bb.max.y, 37.0));
    }

    #[test]
    fn test_set_position_by_center_origin() {
        let mut obj = SceneObject::rect(100.0, 50.0).with_angle(30.0);
        obj.set_position_by_origin(Point::new(200.0, 200.0), OriginX::Center, OriginY::Center);
        let c = obj.center_point();
        assert!(close(c.x, 200.0));
        assert!(close(c.y, 200.0));
    }

    #[test]
    fn test_save_reset_restore() {
        let mut obj = SceneObject::rect(10.0, 10.0)
            .with_scale(3.0, 4.0)
            .with_angle(45.0)
            .with_stroke(Rgba::BLACK, 1.5);
        let record = obj.save_transform();
        obj.reset_transform();
        obj.stroke_width = 8.0;
        assert_eq!(obj.transform.scale_x, 1.0);
        assert_eq!(obj.transform.angle, 0.0);
        obj.restore(&record);
        assert_eq!(obj.save_transform(), record);
    }

    #[test]
    fn test_polygon_is_normalized() {
        let obj = SceneObject::polygon(vec![
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
            Point::new(20.0, 40.0),
        ]);
        assert!(close(obj.width, 20.0));
        assert!(close(obj.height, 30.0));
        match &obj.shape {
            Shape::Polygon(points) => assert_eq!(points[0], Point::new(0.0, 0.0)),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_attach_detach() {
        let mut obj = SceneObject::rect(1.0, 1.0);
        let surface = Uuid::new_v4();
        obj.attach(surface);
        assert_eq!(obj.owner(), Some(surface));
        assert_eq!(obj.detach(), Some(surface));
        assert!(obj.owner().is_none());
    }
}
