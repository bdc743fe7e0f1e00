//! Border rasterization
//!
//! Surfaces are painted in software with tiny-skia and handed to the backend as
//! premultiplied RGBA.

use tiny_skia::{Color, Paint, Path, PathBuilder, Pixmap, Rect as SkRect, Stroke, Transform};

use crate::error::{OverlayError, Result};
use crate::style::{BorderStyle, Rgba};

/// Circle approximation constant for cubic bezier corners
const KAPPA: f32 = 0.552_284_8;

/// Largest surface painted in one go (8192x8192 RGBA)
pub const MAX_SURFACE_BYTES: u64 = 256 * 1024 * 1024;

/// Paint a `width` x `height` surface: fully transparent except for a rounded
/// rectangle stroked `style.width` wide, inset by half the stroke so that its
/// outer edge touches the surface bounds.
///
/// Surfaces above [`MAX_SURFACE_BYTES`] are refused before anything is allocated.
pub fn render_border(width: u32, height: u32, style: &BorderStyle) -> Result<Pixmap> {
    if u64::from(width) * u64::from(height) * 4 > MAX_SURFACE_BYTES {
        return Err(OverlayError::Paint { width, height });
    }
    let mut pixmap = Pixmap::new(width, height).ok_or(OverlayError::Paint { width, height })?;
    pixmap.fill(Color::TRANSPARENT);

    let stroke_width = style.width as f32;
    if !(stroke_width > 0.0) {
        return Ok(pixmap);
    }

    let inset = stroke_width / 2.0;
    let path = match rounded_rect(
        inset,
        inset,
        width as f32 - stroke_width,
        height as f32 - stroke_width,
        style.radius as f32,
    ) {
        Some(path) => path,
        None => return Ok(pixmap),
    };

    let mut paint = Paint::default();
    paint.set_color(to_skia_color(style.color));
    paint.anti_alias = true;

    let stroke = Stroke {
        width: stroke_width,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

    Ok(pixmap)
}

fn to_skia_color(color: Rgba) -> Color {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::from_rgba8(
        channel(color.r),
        channel(color.g),
        channel(color.b),
        channel(color.a),
    )
}

/// Rounded rectangle path; the radius is clamped to half the shorter side.
fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    let rect = SkRect::from_xywh(x, y, w, h)?;
    let r = radius.clamp(0.0, w.min(h) / 2.0);
    if !(r > 0.0) {
        return Some(PathBuilder::from_rect(rect));
    }

    let k = KAPPA * r;
    let (right, bottom) = (x + w, y + h);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}
