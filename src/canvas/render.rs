use ab_glyph::{Font, FontArc, OutlineCurve, ScaleFont};
use image::RgbaImage;
use tiny_skia::{
    FillRule, LineJoin, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, StrokeDash, Transform,
};

use super::fonts::{em_scale, FontBook};
use crate::editor::layout::{bounds_for_layout, layout_text};
use crate::editor::{FontSpec, TextAlign, TextMeasure, TextOverlay};
use crate::geometry::{CanvasBounds, RgbaColor};

const ANCHOR_RADIUS: f32 = 6.0;
const DECORATION_LINE_WIDTH: f32 = 2.0;
const SELECTION_DASH: [f32; 2] = [6.0, 4.0];
const TEXT_MITER_LIMIT: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPalette {
    pub background: RgbaColor,
    pub placeholder_wash: RgbaColor,
    pub placeholder_text: RgbaColor,
    pub selection: RgbaColor,
    pub anchor_fill: RgbaColor,
    pub anchor_outline: RgbaColor,
}

impl Default for CanvasPalette {
    fn default() -> Self {
        Self {
            background: RgbaColor::new(0, 0, 0, 0.18),
            placeholder_wash: RgbaColor::new(255, 255, 255, 0.08),
            placeholder_text: RgbaColor::new(255, 255, 255, 0.75),
            selection: RgbaColor::new(109, 123, 255, 0.9),
            anchor_fill: RgbaColor::new(109, 123, 255, 0.95),
            anchor_outline: RgbaColor::new(0, 0, 0, 0.35),
        }
    }
}

pub(super) fn paint_for(color: RgbaColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.alpha_u8());
    paint.anti_alias = true;
    paint
}

pub(super) fn fill_canvas(pixmap: &mut Pixmap, color: RgbaColor) {
    let Some(rect) = Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32)
    else {
        return;
    };
    pixmap.fill_rect(rect, &paint_for(color), Transform::identity(), None);
}

/// Copies straight-alpha RGBA into a premultiplied pixmap.
pub(super) fn rgba_image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (src_pixel, dst_pixel) in image
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let (r, g, b, a) = (src_pixel[0], src_pixel[1], src_pixel[2], src_pixel[3]);
        match a {
            0 => dst_pixel.fill(0),
            255 => dst_pixel.copy_from_slice(src_pixel),
            _ => {
                let alpha = u16::from(a);
                dst_pixel[0] = ((u16::from(r) * alpha + 127) / 255) as u8;
                dst_pixel[1] = ((u16::from(g) * alpha + 127) / 255) as u8;
                dst_pixel[2] = ((u16::from(b) * alpha + 127) / 255) as u8;
                dst_pixel[3] = a;
            }
        }
    }
    Some(pixmap)
}

/// Glyph outlines of one line, with `top` as the top of the em box.
pub(super) fn text_line_path(
    face: &FontArc,
    font_size: f64,
    text: &str,
    left: f64,
    top: f64,
) -> Option<Path> {
    let scaled = face.as_scaled(em_scale(face, font_size));
    let scale_x = scaled.h_scale_factor();
    let scale_y = scaled.v_scale_factor();
    let baseline = top as f32 + scaled.ascent();

    let mut builder = PathBuilder::new();
    let mut caret = left as f32;
    let mut previous = None;
    for ch in text.chars() {
        let glyph_id = face.glyph_id(ch);
        if let Some(previous) = previous {
            caret += scaled.kern(previous, glyph_id);
        }
        if let Some(outline) = face.outline(glyph_id) {
            let to_canvas = |point: ab_glyph::Point| {
                (caret + point.x * scale_x, baseline - point.y * scale_y)
            };
            append_outline(&mut builder, &outline.curves, to_canvas);
        }
        caret += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
    builder.finish()
}

fn append_outline(
    builder: &mut PathBuilder,
    curves: &[OutlineCurve],
    to_canvas: impl Fn(ab_glyph::Point) -> (f32, f32),
) {
    let mut last: Option<(f32, f32)> = None;
    for curve in curves {
        let start = match curve {
            OutlineCurve::Line(p0, _)
            | OutlineCurve::Quad(p0, _, _)
            | OutlineCurve::Cubic(p0, _, _, _) => to_canvas(*p0),
        };
        let continues = last
            .is_some_and(|(x, y)| (x - start.0).abs() < 1e-3 && (y - start.1).abs() < 1e-3);
        if !continues {
            if last.is_some() {
                builder.close();
            }
            builder.move_to(start.0, start.1);
        }
        let end = match curve {
            OutlineCurve::Line(_, p1) => {
                let end = to_canvas(*p1);
                builder.line_to(end.0, end.1);
                end
            }
            OutlineCurve::Quad(_, p1, p2) => {
                let control = to_canvas(*p1);
                let end = to_canvas(*p2);
                builder.quad_to(control.0, control.1, end.0, end.1);
                end
            }
            OutlineCurve::Cubic(_, p1, p2, p3) => {
                let first = to_canvas(*p1);
                let second = to_canvas(*p2);
                let end = to_canvas(*p3);
                builder.cubic_to(first.0, first.1, second.0, second.1, end.0, end.1);
                end
            }
        };
        last = Some(end);
    }
    if last.is_some() {
        builder.close();
    }
}

/// Outline strokes for every line first, then fills, then selection decoration.
pub(super) fn draw_overlay(
    pixmap: &mut Pixmap,
    fonts: &FontBook,
    overlay: &TextOverlay,
    canvas_width: u32,
    is_active: bool,
    palette: &CanvasPalette,
) {
    let layout = layout_text(overlay, canvas_width, fonts);
    let font = overlay.font_spec();

    if let Some(face) = fonts.face(&font) {
        let line_paths = layout
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .filter_map(|(index, line)| {
                let width = fonts.measure(&font, line);
                let left = overlay.align.line_start(overlay.x, width);
                text_line_path(
                    &face,
                    overlay.font_size,
                    line,
                    left,
                    layout.line_top(overlay.y, index),
                )
            })
            .collect::<Vec<_>>();

        if overlay.stroke_width > 0.0 {
            let paint = paint_for(overlay.stroke_color.with_alpha(1.0));
            let stroke = Stroke {
                width: overlay.stroke_width as f32,
                line_join: LineJoin::Round,
                miter_limit: TEXT_MITER_LIMIT,
                ..Stroke::default()
            };
            for path in &line_paths {
                pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
            }
        }

        let paint = paint_for(overlay.fill_color.with_alpha(1.0));
        for path in &line_paths {
            pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    if is_active {
        draw_anchor(pixmap, overlay, palette);
        if let Some(bounds) = bounds_for_layout(overlay, &layout, fonts) {
            draw_selection_box(pixmap, bounds, palette);
        }
    }
}

fn draw_anchor(pixmap: &mut Pixmap, overlay: &TextOverlay, palette: &CanvasPalette) {
    let Some(circle) = PathBuilder::from_circle(overlay.x as f32, overlay.y as f32, ANCHOR_RADIUS)
    else {
        return;
    };
    pixmap.fill_path(
        &circle,
        &paint_for(palette.anchor_fill),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    let stroke = Stroke {
        width: DECORATION_LINE_WIDTH,
        ..Stroke::default()
    };
    pixmap.stroke_path(
        &circle,
        &paint_for(palette.anchor_outline),
        &stroke,
        Transform::identity(),
        None,
    );
}

fn draw_selection_box(pixmap: &mut Pixmap, bounds: CanvasBounds, palette: &CanvasPalette) {
    let Some(rect) = Rect::from_xywh(
        bounds.x as f32,
        bounds.y as f32,
        bounds.width as f32,
        bounds.height as f32,
    ) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let stroke = Stroke {
        width: DECORATION_LINE_WIDTH,
        dash: StrokeDash::new(SELECTION_DASH.to_vec(), 0.0),
        ..Stroke::default()
    };
    pixmap.stroke_path(
        &path,
        &paint_for(palette.selection),
        &stroke,
        Transform::identity(),
        None,
    );
}

pub(super) fn draw_centered_message(
    pixmap: &mut Pixmap,
    fonts: &FontBook,
    font: &FontSpec,
    message: &str,
    color: RgbaColor,
) {
    let Some(face) = fonts.face(font) else {
        return;
    };
    let width = fonts.measure(font, message);
    let center_x = f64::from(pixmap.width()) / 2.0;
    let top = f64::from(pixmap.height()) / 2.0 - font.size / 2.0;
    let left = TextAlign::Center.line_start(center_x, width);
    if let Some(path) = text_line_path(&face, font.size, message, left, top) {
        pixmap.fill_path(
            &path,
            &paint_for(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_image_to_pixmap_premultiplies_partial_alpha() {
        let mut image = RgbaImage::new(3, 1);
        image.put_pixel(0, 0, image::Rgba([10, 20, 30, 0]));
        image.put_pixel(1, 0, image::Rgba([10, 20, 30, 255]));
        image.put_pixel(2, 0, image::Rgba([200, 100, 50, 128]));
        let pixmap = rgba_image_to_pixmap(&image).expect("pixmap");
        assert_eq!(&pixmap.data()[0..4], &[0, 0, 0, 0]);
        assert_eq!(&pixmap.data()[4..8], &[10, 20, 30, 255]);
        assert_eq!(&pixmap.data()[8..12], &[100, 50, 25, 128]);
    }

    #[test]
    fn palette_alpha_converts_to_bytes() {
        let palette = CanvasPalette::default();
        assert_eq!(palette.background.alpha_u8(), 46);
        assert_eq!(palette.anchor_outline.alpha_u8(), 89);
    }
}
