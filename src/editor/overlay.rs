use super::layout::FontSpec;
use crate::geometry::{CanvasPoint, CanvasSize, Color};

pub const DEFAULT_TEXT: &str = "Your text";
pub const DEFAULT_FONT_FAMILY: &str = "Impact, Arial Black, system-ui, sans-serif";
pub const DEFAULT_FONT_SIZE: f64 = 56.0;
pub const DEFAULT_FONT_WEIGHT: u16 = 900;
pub const DEFAULT_STROKE_WIDTH: f64 = 10.0;

/// Font family lists offered by the layer form, as (label, family list).
pub const FONT_FAMILY_CHOICES: &[(&str, &str)] = &[
    ("Impact", DEFAULT_FONT_FAMILY),
    ("Arial Black", "Arial Black, Arial, system-ui, sans-serif"),
    (
        "System",
        "system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif",
    ),
    ("Georgia", "Georgia, serif"),
    (
        "Courier New",
        "Courier New, ui-monospace, SFMono-Regular, Menlo, Monaco, Consolas, monospace",
    ),
];

const WRAP_WIDTH_RATIO: f64 = 0.92;
const INITIAL_Y_RATIO: f64 = 0.15;
const INITIAL_Y_MAX: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub const ALL: [Self; 3] = [Self::Left, Self::Center, Self::Right];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Left edge of a line of `width` anchored at `anchor_x`.
    pub fn line_start(self, anchor_x: f64, width: f64) -> f64 {
        match self {
            Self::Left => anchor_x,
            Self::Center => anchor_x - width / 2.0,
            Self::Right => anchor_x - width,
        }
    }
}

/// One property change on an overlay, as produced by the layer form.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEdit {
    Text(String),
    FontSize(f64),
    FontFamily(String),
    FillColor(Color),
    StrokeColor(Color),
    StrokeWidth(f64),
    Align(TextAlign),
    FontWeight(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub id: u64,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub font_family: String,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub align: TextAlign,
    pub max_width: Option<f64>,
    pub font_weight: u16,
}

impl TextOverlay {
    pub fn new(id: u64, canvas: CanvasSize, text: Option<&str>) -> Self {
        let width = f64::from(canvas.width);
        let height = f64::from(canvas.height);
        Self {
            id,
            text: text.unwrap_or(DEFAULT_TEXT).to_string(),
            x: round_half_up(width / 2.0),
            y: round_half_up((height * INITIAL_Y_RATIO).min(INITIAL_Y_MAX)),
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            fill_color: Color::WHITE,
            stroke_color: Color::BLACK,
            stroke_width: DEFAULT_STROKE_WIDTH,
            align: TextAlign::Center,
            max_width: Some(default_wrap_width(canvas.width)),
            font_weight: DEFAULT_FONT_WEIGHT,
        }
    }

    pub const fn anchor(&self) -> CanvasPoint {
        CanvasPoint::new(self.x, self.y)
    }

    pub fn font_spec(&self) -> FontSpec {
        FontSpec::new(self.font_family.clone(), self.font_size, self.font_weight)
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = clamp_font_size(size);
    }

    pub fn set_font_weight(&mut self, weight: u16) {
        self.font_weight = clamp_font_weight(weight);
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = if width.is_finite() { width.max(0.0) } else { 0.0 };
    }

    pub fn apply_edit(&mut self, edit: OverlayEdit) {
        match edit {
            OverlayEdit::Text(text) => self.text = text,
            OverlayEdit::FontSize(size) => self.set_font_size(size),
            OverlayEdit::FontFamily(family) => self.font_family = family,
            OverlayEdit::FillColor(color) => self.fill_color = color,
            OverlayEdit::StrokeColor(color) => self.stroke_color = color,
            OverlayEdit::StrokeWidth(width) => self.set_stroke_width(width),
            OverlayEdit::Align(align) => self.align = align,
            OverlayEdit::FontWeight(weight) => self.set_font_weight(weight),
        }
    }

    /// Resets the wrap width to the canvas-relative default.
    pub fn fit_wrap_width(&mut self, canvas: CanvasSize) {
        self.max_width = Some(default_wrap_width(canvas.width));
    }

    /// Pins the anchor inside the canvas. Glyphs may still extend past the edges.
    pub fn clamp_to(&mut self, canvas: CanvasSize) {
        let clamped = canvas.clamp_point(self.anchor());
        self.x = clamped.x;
        self.y = clamped.y;
    }
}

pub fn default_wrap_width(canvas_width: u32) -> f64 {
    round_half_up(f64::from(canvas_width) * WRAP_WIDTH_RATIO)
}

/// Rounds halves toward positive infinity, matching canvas pixel snapping.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn clamp_font_size(size: f64) -> f64 {
    if size.is_finite() {
        size.max(1.0)
    } else {
        DEFAULT_FONT_SIZE
    }
}

const fn clamp_font_weight(weight: u16) -> u16 {
    if weight < 100 {
        100
    } else if weight > 1000 {
        1000
    } else {
        weight
    }
}
