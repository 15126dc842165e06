//! Software rasterizer for [`Drawable`] descriptions.

use std::f32::consts::TAU;

use image::{Rgba, RgbaImage};

use crate::charts::drawable::{Color, Drawable, Shape};

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}

/// Clamped pixel range covering `[lo, hi)`.
fn span(lo: f32, hi: f32, limit: u32) -> std::ops::Range<u32> {
    let start = lo.floor().max(0.0) as u32;
    let end = (hi.ceil().max(0.0) as u32).min(limit);
    start.min(end)..end
}

/// Paints a drawable onto a new RGBA image.
pub fn rasterize(drawable: &Drawable) -> RgbaImage {
    let mut frame = RgbaImage::from_pixel(drawable.width, drawable.height, rgba(drawable.background));
    for shape in &drawable.shapes {
        match shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
                color,
            } => fill_rect(&mut frame, *x, *y, *width, *height, *color),
            Shape::Arc {
                cx,
                cy,
                radius,
                inner_radius,
                start,
                sweep,
                color,
            } => fill_arc(&mut frame, (*cx, *cy), *radius, *inner_radius, *start, *sweep, *color),
            Shape::Polyline {
                points,
                width,
                color,
            } => {
                for pair in points.windows(2) {
                    stroke_segment(&mut frame, pair[0], pair[1], *width, *color);
                }
            }
        }
    }
    frame
}

fn fill_rect(frame: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, color: Color) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let pixel = rgba(color);
    for py in span(y, y + height, frame.height()) {
        for px in span(x, x + width, frame.width()) {
            frame.put_pixel(px, py, pixel);
        }
    }
}

fn fill_arc(
    frame: &mut RgbaImage,
    (cx, cy): (f32, f32),
    radius: f32,
    inner_radius: f32,
    start: f32,
    sweep: f32,
    color: Color,
) {
    if radius <= 0.0 || sweep <= 0.0 {
        return;
    }
    let pixel = rgba(color);
    let full_turn = sweep >= TAU;

    for py in span(cy - radius, cy + radius, frame.height()) {
        for px in span(cx - radius, cx + radius, frame.width()) {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance > radius || distance < inner_radius {
                continue;
            }
            if !full_turn {
                let offset = (dy.atan2(dx) - start).rem_euclid(TAU);
                if offset > sweep {
                    continue;
                }
            }
            frame.put_pixel(px, py, pixel);
        }
    }
}

fn stroke_segment(frame: &mut RgbaImage, a: (f32, f32), b: (f32, f32), width: f32, color: Color) {
    let pixel = rgba(color);
    let half = (width / 2.0).max(0.5);
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let length_sq = dx * dx + dy * dy;

    for py in span(a.1.min(b.1) - half, a.1.max(b.1) + half, frame.height()) {
        for px in span(a.0.min(b.0) - half, a.0.max(b.0) + half, frame.width()) {
            let (qx, qy) = (px as f32 + 0.5, py as f32 + 0.5);
            let t = if length_sq > 0.0 {
                (((qx - a.0) * dx + (qy - a.1) * dy) / length_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (nx, ny) = (a.0 + t * dx - qx, a.1 + t * dy - qy);
            if nx * nx + ny * ny <= half * half {
                frame.put_pixel(px, py, pixel);
            }
        }
    }
}
