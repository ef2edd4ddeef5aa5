use super::overlay::round_half_up;
use super::*;
use crate::geometry::{CanvasPoint, CanvasSize};

const STAGGER_LINE_RATIO: f64 = 1.05;
const STAGGER_BOTTOM_MARGIN: f64 = 60.0;

impl EditorLayers {
    /// Appends a new overlay below the previous ones and selects it.
    pub fn add_overlay(&mut self, canvas: CanvasSize, text: Option<&str>) -> u64 {
        let id = self.allocate_id();
        let mut overlay = TextOverlay::new(id, canvas, text);
        let stagger = self.overlays.len() as f64 * (overlay.font_size * STAGGER_LINE_RATIO);
        overlay.y = round_half_up(
            (f64::from(canvas.height) - STAGGER_BOTTOM_MARGIN).min(overlay.y + stagger),
        );
        overlay.fit_wrap_width(canvas);
        overlay.clamp_to(canvas);
        self.overlays.push(overlay);
        self.active_overlay = Some(id);
        tracing::debug!(id, count = self.overlays.len(), "added text layer");
        id
    }

    /// Removes the selected overlay and selects the new last one, if any.
    pub fn remove_active(&mut self) -> Option<TextOverlay> {
        let id = self.active_overlay?;
        let index = self.overlays.iter().position(|overlay| overlay.id == id);
        let removed = index.map(|index| self.overlays.remove(index));
        self.active_overlay = self.overlays.last().map(|overlay| overlay.id);
        tracing::debug!(id, next_active = ?self.active_overlay, "removed text layer");
        removed
    }

    pub fn select(&mut self, id: Option<u64>) -> Result<(), EditorError> {
        match id {
            Some(id) if self.get(id).is_none() => Err(EditorError::OverlayNotFound(id)),
            _ => {
                self.active_overlay = id;
                Ok(())
            }
        }
    }

    pub fn move_overlay_to(
        &mut self,
        id: u64,
        anchor: CanvasPoint,
        canvas: CanvasSize,
    ) -> Result<(), EditorError> {
        let overlay = self.find_mut(id).ok_or(EditorError::OverlayNotFound(id))?;
        overlay.x = anchor.x;
        overlay.y = anchor.y;
        overlay.fit_wrap_width(canvas);
        overlay.clamp_to(canvas);
        Ok(())
    }

    pub fn edit_active(&mut self, edit: OverlayEdit, canvas: CanvasSize) -> Result<(), EditorError> {
        let id = self.active_overlay.ok_or(EditorError::NoActiveOverlay)?;
        let overlay = self.find_mut(id).ok_or(EditorError::OverlayNotFound(id))?;
        overlay.apply_edit(edit);
        overlay.fit_wrap_width(canvas);
        overlay.clamp_to(canvas);
        Ok(())
    }

    /// Re-fits every overlay after the canvas changed size.
    pub fn fit_to_canvas(&mut self, canvas: CanvasSize) {
        for overlay in &mut self.overlays {
            overlay.fit_wrap_width(canvas);
            overlay.clamp_to(canvas);
        }
    }
}
