//! Text wrapping, bounding boxes and hit testing for overlays.
//!
//! Everything here is measured through [`TextMeasure`], so the layout rules can
//! be exercised without any font files or drawing backend.

use super::overlay::{default_wrap_width, round_half_up, TextOverlay};
use crate::geometry::{CanvasBounds, CanvasPoint};

/// Wrap widths below this are raised to it, so narrow canvases still make progress.
pub const MIN_WRAP_WIDTH: f64 = 80.0;
pub const LINE_HEIGHT_RATIO: f64 = 1.12;
pub const MIN_SELECTION_PADDING: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    pub weight: u16,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f64, weight: u16) -> Self {
        Self {
            family: family.into(),
            size,
            weight,
        }
    }
}

/// Horizontal advance of a string rendered in a given font.
pub trait TextMeasure {
    fn measure(&self, font: &FontSpec, text: &str) -> f64;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure(&self, font: &FontSpec, text: &str) -> f64 {
        (**self).measure(font, text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub line_height: f64,
    pub max_width: f64,
}

impl TextLayout {
    pub fn line_top(&self, anchor_y: f64, index: usize) -> f64 {
        anchor_y + index as f64 * self.line_height
    }
}

pub fn line_height(font_size: f64) -> f64 {
    round_half_up(font_size * LINE_HEIGHT_RATIO).max(1.0)
}

pub fn effective_wrap_width(overlay: &TextOverlay, canvas_width: u32) -> f64 {
    overlay
        .max_width
        .unwrap_or_else(|| default_wrap_width(canvas_width))
        .max(MIN_WRAP_WIDTH)
}

/// Greedy word wrap. Each `\n` starts a paragraph; empty paragraphs keep one empty line.
pub fn wrap_paragraphs(
    text: &str,
    wrap_width: f64,
    mut measure_width: impl FnMut(&str) -> f64,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut words = paragraph.split_whitespace();
        let Some(first) = words.next() else {
            lines.push(String::new());
            continue;
        };

        let mut current = first.to_string();
        for word in words {
            let candidate = format!("{current} {word}");
            if measure_width(&candidate) <= wrap_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

pub fn layout_text(
    overlay: &TextOverlay,
    canvas_width: u32,
    measure: &dyn TextMeasure,
) -> TextLayout {
    let font = overlay.font_spec();
    let max_width = effective_wrap_width(overlay, canvas_width);
    let lines = wrap_paragraphs(&overlay.text, max_width, |line| {
        measure.measure(&font, line)
    });
    TextLayout {
        lines,
        line_height: line_height(overlay.font_size),
        max_width,
    }
}

/// Padded box around the rendered glyphs of an already laid out overlay.
pub fn bounds_for_layout(
    overlay: &TextOverlay,
    layout: &TextLayout,
    measure: &dyn TextMeasure,
) -> Option<CanvasBounds> {
    if layout.lines.is_empty() {
        return None;
    }

    let font = overlay.font_spec();
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for line in &layout.lines {
        let width = measure.measure(&font, line).max(0.0);
        let start = overlay.align.line_start(overlay.x, width);
        min_x = min_x.min(start);
        max_x = max_x.max(start + width);
    }

    let pad = selection_padding(overlay.stroke_width);
    Some(CanvasBounds::new(
        round_half_up(min_x - pad),
        round_half_up(overlay.y - pad),
        round_half_up(max_x - min_x + pad * 2.0),
        round_half_up(layout.lines.len() as f64 * layout.line_height + pad * 2.0),
    ))
}

pub fn overlay_bounds(
    overlay: &TextOverlay,
    canvas_width: u32,
    measure: &dyn TextMeasure,
) -> Option<CanvasBounds> {
    let layout = layout_text(overlay, canvas_width, measure);
    bounds_for_layout(overlay, &layout, measure)
}

pub fn hit_test(
    overlay: &TextOverlay,
    canvas_width: u32,
    measure: &dyn TextMeasure,
    point: CanvasPoint,
) -> bool {
    overlay_bounds(overlay, canvas_width, measure).is_some_and(|bounds| bounds.contains(point))
}

/// Keeps thick outlines inside the selection box.
pub fn selection_padding(stroke_width: f64) -> f64 {
    MIN_SELECTION_PADDING.max(round_half_up(stroke_width.max(0.0) / 2.0))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Every character advances by the same amount.
    pub(crate) struct MonospaceMeasure(pub f64);

    impl TextMeasure for MonospaceMeasure {
        fn measure(&self, _font: &FontSpec, text: &str) -> f64 {
            text.chars().count() as f64 * self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MonospaceMeasure;
    use super::*;
    use crate::editor::overlay::TextAlign;
    use crate::geometry::CanvasSize;

    const MONO: MonospaceMeasure = MonospaceMeasure(30.0);

    fn overlay_with(text: &str, max_width: f64) -> TextOverlay {
        let mut overlay = TextOverlay::new(1, CanvasSize::new(800, 450), Some(text));
        overlay.x = 400.0;
        overlay.y = 90.0;
        overlay.font_size = 56.0;
        overlay.align = TextAlign::Center;
        overlay.max_width = Some(max_width);
        overlay
    }

    fn mono_width(text: &str) -> f64 {
        text.chars().count() as f64 * 30.0
    }

    #[test]
    fn hello_world_fits_on_one_line_when_width_permits() {
        let layout = layout_text(&overlay_with("HELLO WORLD", 736.0), 800, &MONO);
        assert_eq!(layout.lines, vec!["HELLO WORLD"]);
        assert_eq!(layout.line_height, 63.0);
        assert_eq!(layout.max_width, 736.0);

        let exact = layout_text(&overlay_with("HELLO WORLD", 330.0), 800, &MONO);
        assert_eq!(exact.lines, vec!["HELLO WORLD"]);
    }

    #[test]
    fn hello_world_splits_on_narrow_width() {
        let layout = layout_text(&overlay_with("HELLO WORLD", 200.0), 800, &MONO);
        assert_eq!(layout.lines, vec!["HELLO", "WORLD"]);
    }

    #[test]
    fn wrap_width_has_a_floor() {
        let layout = layout_text(&overlay_with("AB CD", 10.0), 800, &MONO);
        assert_eq!(layout.max_width, MIN_WRAP_WIDTH);
        assert_eq!(layout.lines, vec!["AB", "CD"]);
    }

    #[test]
    fn missing_max_width_uses_canvas_relative_default() {
        let mut overlay = overlay_with("x", 0.0);
        overlay.max_width = None;
        assert_eq!(effective_wrap_width(&overlay, 1000), 920.0);
    }

    #[test]
    fn wrapped_lines_respect_width_except_single_long_words() {
        let text = "the quick brown fox jumps over an extraordinarilylongword and keeps going";
        let wrap = 300.0;
        let lines = wrap_paragraphs(text, wrap, mono_width);
        assert!(lines.len() > 1);
        for line in &lines {
            if line.contains(' ') {
                assert!(mono_width(line) <= wrap, "line {line:?} exceeds wrap width");
            }
        }
        assert!(lines.contains(&"extraordinarilylongword".to_string()));
    }

    #[test]
    fn rewrapping_wrapped_lines_is_stable() {
        let text = "one two three four five six seven\n\neight nine ten eleven twelve";
        let first = wrap_paragraphs(text, 250.0, mono_width);
        let second = wrap_paragraphs(&first.join("\n"), 250.0, mono_width);
        assert_eq!(first, second);
    }

    #[test]
    fn blank_paragraphs_become_distinct_empty_lines() {
        let lines = wrap_paragraphs("TOP\n\n\nBOTTOM", 500.0, mono_width);
        assert_eq!(lines, vec!["TOP", "", "", "BOTTOM"]);
        assert_eq!(wrap_paragraphs("", 500.0, mono_width), vec![""]);
        assert_eq!(wrap_paragraphs("   ", 500.0, mono_width), vec![""]);
    }

    #[test]
    fn whitespace_runs_collapse_between_words() {
        let lines = wrap_paragraphs("  a \t  b  ", 500.0, mono_width);
        assert_eq!(lines, vec!["a b"]);
    }

    #[test]
    fn bounds_are_padded_around_centered_text() {
        let overlay = overlay_with("HELLO WORLD", 736.0);
        let bounds = overlay_bounds(&overlay, 800, &MONO).expect("one line should have bounds");
        assert_eq!(bounds, CanvasBounds::new(229.0, 84.0, 342.0, 75.0));
    }

    #[test]
    fn thick_outline_widens_padding() {
        let mut overlay = overlay_with("HI", 736.0);
        overlay.stroke_width = 30.0;
        let bounds = overlay_bounds(&overlay, 800, &MONO).expect("bounds");
        assert_eq!(bounds.y, 75.0);
        assert_eq!(bounds.width, 60.0 + 30.0);
    }

    #[test]
    fn bounds_contain_anchor_for_every_alignment() {
        for align in TextAlign::ALL {
            let mut overlay = overlay_with("SOME TEXT\nHERE", 736.0);
            overlay.align = align;
            let bounds = overlay_bounds(&overlay, 800, &MONO).expect("bounds");
            assert!(bounds.width >= 0.0 && bounds.height >= 0.0);
            assert!(bounds.contains(overlay.anchor()), "{align:?} box misses anchor");
        }
    }

    #[test]
    fn empty_text_still_has_a_box() {
        let overlay = overlay_with("", 736.0);
        let bounds = overlay_bounds(&overlay, 800, &MONO).expect("empty line keeps a box");
        assert_eq!(bounds.width, 12.0);
        assert!(bounds.contains(overlay.anchor()));
    }

    #[test]
    fn hit_test_accepts_anchor_and_rejects_far_points() {
        let overlay = overlay_with("HELLO WORLD", 736.0);
        assert!(hit_test(&overlay, 800, &MONO, overlay.anchor()));
        let bounds = overlay_bounds(&overlay, 800, &MONO).expect("bounds");
        let far = CanvasPoint::new(
            bounds.x + bounds.width * 10.0,
            bounds.y + bounds.height * 10.0,
        );
        assert!(!hit_test(&overlay, 800, &MONO, far));
        assert!(hit_test(
            &overlay,
            800,
            &MONO,
            CanvasPoint::new(bounds.right(), bounds.bottom())
        ));
    }
}
