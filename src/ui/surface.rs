use gtk4::cairo;
use tiny_skia::Pixmap;

use crate::geometry::{CanvasSize, DisplayRect};

/// Largest rectangle with the canvas aspect ratio, centered in the widget.
pub(super) fn fit_display_rect(canvas: CanvasSize, widget_width: i32, widget_height: i32) -> DisplayRect {
    let widget_width = f64::from(widget_width.max(0));
    let widget_height = f64::from(widget_height.max(0));
    let canvas_width = f64::from(canvas.width.max(1));
    let canvas_height = f64::from(canvas.height.max(1));
    let scale = (widget_width / canvas_width).min(widget_height / canvas_height);
    let width = canvas_width * scale;
    let height = canvas_height * scale;
    DisplayRect::new(
        (widget_width - width) / 2.0,
        (widget_height - height) / 2.0,
        width,
        height,
    )
}

/// Copies a premultiplied RGBA pixmap into a native-endian ARGB32 surface.
pub(super) fn pixmap_to_cairo_surface(pixmap: &Pixmap) -> Option<cairo::ImageSurface> {
    let width = i32::try_from(pixmap.width()).ok()?;
    let height = i32::try_from(pixmap.height()).ok()?;
    let mut surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height).ok()?;
    let stride = usize::try_from(surface.stride()).ok()?;

    {
        let mut data = surface.data().ok()?;
        let row_len = usize::try_from(pixmap.width()).ok()?.checked_mul(4)?;
        for (row, src_row) in pixmap.data().chunks_exact(row_len).enumerate() {
            let dst_row_offset = row.checked_mul(stride)?;
            let dst_row_end = dst_row_offset.checked_add(row_len)?;
            if dst_row_end > data.len() {
                return None;
            }
            let dst_row = &mut data[dst_row_offset..dst_row_end];
            for (src_pixel, dst_pixel) in src_row.chunks_exact(4).zip(dst_row.chunks_exact_mut(4)) {
                let argb = u32::from(src_pixel[3]) << 24
                    | u32::from(src_pixel[0]) << 16
                    | u32::from(src_pixel[1]) << 8
                    | u32::from(src_pixel[2]);
                dst_pixel.copy_from_slice(&argb.to_ne_bytes());
            }
        }
    }

    surface.mark_dirty();
    Some(surface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rect_letterboxes_wide_canvas() {
        let rect = fit_display_rect(CanvasSize::new(800, 450), 1000, 1000);
        assert_eq!(rect, DisplayRect::new(0.0, 218.75, 1000.0, 562.5));

        let rect = fit_display_rect(CanvasSize::new(800, 450), 1600, 450);
        assert_eq!(rect, DisplayRect::new(400.0, 0.0, 800.0, 450.0));
    }

    #[test]
    fn display_rect_collapses_for_hidden_widget() {
        let rect = fit_display_rect(CanvasSize::new(800, 450), 0, 300);
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.height, 0.0);
    }
}
