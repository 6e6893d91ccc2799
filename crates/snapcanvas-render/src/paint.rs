//! Rasterizes scene objects into a pixmap with tiny-skia.

use snapcanvas_core::{Affine, BBox, Point, Rgba, SceneObject, Shape};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::error::{ExportError, Result};

/// Selection border and corner handle color.
pub const CONTROL_COLOR: Rgba = Rgba::rgb(102, 153, 255);
/// Edge length of a corner handle, in pixels.
pub const CONTROL_SIZE: f32 = 10.0;

fn to_skia(m: &Affine) -> Transform {
    let [a, b, c, d, e, f] = m.0;
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn paint_for(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Outline in object space, centered on the origin.
fn build_path(object: &SceneObject) -> Option<Path> {
    let (w, h) = (object.width as f32, object.height as f32);
    let (hw, hh) = (w / 2.0, h / 2.0);
    match &object.shape {
        Shape::Rect => Rect::from_xywh(-hw, -hh, w, h).map(PathBuilder::from_rect),
        Shape::Ellipse => Rect::from_xywh(-hw, -hh, w, h).and_then(PathBuilder::from_oval),
        Shape::Polygon(points) => {
            let mut pb = PathBuilder::new();
            let mut iter = points.iter();
            let first = iter.next()?;
            pb.move_to(first.x as f32 - hw, first.y as f32 - hh);
            for p in iter {
                pb.line_to(p.x as f32 - hw, p.y as f32 - hh);
            }
            pb.close();
            pb.finish()
        }
    }
}

/// Draw one object under `viewport · object matrix`.
///
/// A non-finite matrix fails the render pass; a degenerate outline paints
/// nothing.
pub fn draw_object(pixmap: &mut Pixmap, object: &SceneObject, viewport: &Affine) -> Result<()> {
    let matrix = viewport.multiply(&object.calc_transform_matrix());
    if !matrix.is_finite() {
        return Err(ExportError::RenderFailure(format!(
            "object {} has a non-finite transform",
            object.id
        )));
    }
    let Some(path) = build_path(object) else {
        return Ok(());
    };
    let transform = to_skia(&matrix);

    if let Some(fill) = object.fill {
        pixmap.fill_path(&path, &paint_for(fill), FillRule::Winding, transform, None);
    }
    if let Some(stroke) = object.stroke {
        if object.stroke_width > 0.0 {
            let style = Stroke {
                width: object.stroke_width as f32,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint_for(stroke), &style, transform, None);
        }
    }
    Ok(())
}

/// Screen-space box of an object under the viewport.
pub fn screen_bounds(object: &SceneObject, viewport: &Affine) -> Option<BBox> {
    let bb = object.bounding_rect();
    let corners = [
        viewport.apply(&bb.min),
        viewport.apply(&Point::new(bb.max.x, bb.min.y)),
        viewport.apply(&bb.max),
        viewport.apply(&Point::new(bb.min.x, bb.max.y)),
    ];
    BBox::from_points(&corners)
}

/// Selection border plus corner handles; only drawn on interactive surfaces.
pub fn draw_controls(pixmap: &mut Pixmap, object: &SceneObject, viewport: &Affine) {
    let Some(bb) = screen_bounds(object, viewport) else {
        return;
    };
    let paint = paint_for(CONTROL_COLOR);

    if let Some(rect) = Rect::from_ltrb(
        bb.min.x as f32,
        bb.min.y as f32,
        bb.max.x as f32,
        bb.max.y as f32,
    ) {
        let border = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(
            &PathBuilder::from_rect(rect),
            &paint,
            &border,
            Transform::identity(),
            None,
        );
    }

    let half = CONTROL_SIZE / 2.0;
    for corner in [
        bb.min,
        Point::new(bb.max.x, bb.min.y),
        bb.max,
        Point::new(bb.min.x, bb.max.y),
    ] {
        if let Some(handle) = Rect::from_xywh(
            corner.x as f32 - half,
            corner.y as f32 - half,
            CONTROL_SIZE,
            CONTROL_SIZE,
        ) {
            pixmap.fill_rect(handle, &paint, Transform::identity(), None);
        }
    }
}
