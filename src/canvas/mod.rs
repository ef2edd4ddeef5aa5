//! Drawing surface: owns the export-resolution pixel buffer and repaints it.

pub mod fonts;
mod render;

use thiserror::Error;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

pub use fonts::FontBook;
use render::CanvasPalette;

use crate::editor::{EditorLayers, FontSpec};
use crate::geometry::{CanvasPoint, CanvasSize, DisplayRect};
use crate::imaging::{fit_within, LoadedImage, DEFAULT_MAX_DIMENSION};

pub const FALLBACK_SIZE: CanvasSize = CanvasSize::new(800, 450);
pub const PLACEHOLDER_MESSAGE: &str = "Upload an image or pick a random template";
const PLACEHOLDER_FONT_FAMILY: &str =
    "system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif";
const PLACEHOLDER_FONT_SIZE: f64 = 22.0;
const PLACEHOLDER_FONT_WEIGHT: u16 = 700;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("cannot allocate a {width}x{height} canvas")]
    Allocation { width: u32, height: u32 },
}

pub struct MemeCanvas {
    size: CanvasSize,
    pixmap: Pixmap,
    image: Option<Pixmap>,
    fonts: FontBook,
    palette: CanvasPalette,
    max_dimension: u32,
}

impl std::fmt::Debug for MemeCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemeCanvas")
            .field("size", &self.size)
            .field("has_image", &self.image.is_some())
            .field("fonts", &self.fonts)
            .field("max_dimension", &self.max_dimension)
            .finish()
    }
}

fn allocate(size: CanvasSize) -> Result<Pixmap, CanvasError> {
    Pixmap::new(size.width, size.height).ok_or(CanvasError::Allocation {
        width: size.width,
        height: size.height,
    })
}

impl MemeCanvas {
    pub fn new(fonts: FontBook, max_dimension: u32) -> Result<Self, CanvasError> {
        Ok(Self {
            size: FALLBACK_SIZE,
            pixmap: allocate(FALLBACK_SIZE)?,
            image: None,
            fonts,
            palette: CanvasPalette::default(),
            max_dimension: if max_dimension == 0 {
                DEFAULT_MAX_DIMENSION
            } else {
                max_dimension
            },
        })
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Replaces the base image and resizes the canvas to fit it. The previous
    /// bitmap is dropped here.
    pub fn set_image(&mut self, image: Option<LoadedImage>) -> Result<CanvasSize, CanvasError> {
        let next_size = image
            .as_ref()
            .map(|image| {
                let (width, height) = image.natural_size();
                let (width, height) = fit_within(width, height, self.max_dimension);
                if width == 0 || height == 0 {
                    FALLBACK_SIZE
                } else {
                    CanvasSize::new(width, height)
                }
            })
            .unwrap_or(FALLBACK_SIZE);

        let pixmap = allocate(next_size)?;
        let image = match image {
            Some(source) => Some(render::rgba_image_to_pixmap(source.bitmap()).ok_or_else(
                || {
                    let (width, height) = source.dimensions();
                    CanvasError::Allocation { width, height }
                },
            )?),
            None => None,
        };

        if self.image.is_some() {
            tracing::debug!("released previous image");
        }
        self.image = image;
        self.pixmap = pixmap;
        self.size = next_size;
        Ok(next_size)
    }

    /// Client (pointer) coordinates to canvas pixels, undoing display scaling.
    pub fn client_to_canvas(&self, client: CanvasPoint, display: DisplayRect) -> CanvasPoint {
        let scale_x = if display.width > 0.0 {
            f64::from(self.size.width) / display.width
        } else {
            1.0
        };
        let scale_y = if display.height > 0.0 {
            f64::from(self.size.height) / display.height
        } else {
            1.0
        };
        CanvasPoint::new(
            (client.x - display.left) * scale_x,
            (client.y - display.top) * scale_y,
        )
    }

    /// Full repaint: wash, base image or placeholder, then overlays in list order.
    pub fn draw(&mut self, layers: &EditorLayers) {
        let width = self.size.width;
        let height = self.size.height;
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        render::fill_canvas(&mut self.pixmap, self.palette.background);

        match &self.image {
            Some(image) => {
                let scale_x = width as f32 / image.width().max(1) as f32;
                let scale_y = height as f32 / image.height().max(1) as f32;
                let paint = PixmapPaint {
                    quality: FilterQuality::Bicubic,
                    ..PixmapPaint::default()
                };
                self.pixmap.draw_pixmap(
                    0,
                    0,
                    image.as_ref(),
                    &paint,
                    Transform::from_scale(scale_x, scale_y),
                    None,
                );
            }
            None => {
                render::fill_canvas(&mut self.pixmap, self.palette.placeholder_wash);
                let font = FontSpec::new(
                    PLACEHOLDER_FONT_FAMILY,
                    PLACEHOLDER_FONT_SIZE,
                    PLACEHOLDER_FONT_WEIGHT,
                );
                render::draw_centered_message(
                    &mut self.pixmap,
                    &self.fonts,
                    &font,
                    PLACEHOLDER_MESSAGE,
                    self.palette.placeholder_text,
                );
            }
        }

        let active_id = layers.active_id();
        for overlay in layers.overlays() {
            render::draw_overlay(
                &mut self.pixmap,
                &self.fonts,
                overlay,
                width,
                active_id == Some(overlay.id),
                &self.palette,
            );
        }
    }
}

#[cfg(test)]
impl MemeCanvas {
    pub(crate) fn has_image(&self) -> bool {
        self.image.is_some()
    }
}
