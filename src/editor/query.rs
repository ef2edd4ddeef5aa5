use super::layout::{hit_test, TextMeasure};
use super::*;
use crate::geometry::CanvasPoint;

/// Row shown in the layer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub id: u64,
    pub label: String,
    pub position: String,
    pub size: String,
    pub selected: bool,
}

impl EditorLayers {
    pub fn active_id(&self) -> Option<u64> {
        self.active_overlay
    }

    pub fn active(&self) -> Option<&TextOverlay> {
        self.active_overlay.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: u64) -> Option<&TextOverlay> {
        self.overlays.iter().find(|overlay| overlay.id == id)
    }

    /// Top-most overlay whose padded box contains `point`.
    pub fn top_most_at(
        &self,
        point: CanvasPoint,
        canvas_width: u32,
        measure: &dyn TextMeasure,
    ) -> Option<u64> {
        self.overlays
            .iter()
            .rev()
            .find(|overlay| hit_test(overlay, canvas_width, measure, point))
            .map(|overlay| overlay.id)
    }

    pub fn summaries(&self) -> Vec<LayerSummary> {
        self.overlays
            .iter()
            .enumerate()
            .map(|(index, overlay)| {
                let trimmed = overlay.text.trim();
                let label = if trimmed.is_empty() {
                    format!("Text layer {}", index + 1)
                } else {
                    trimmed.to_string()
                };
                LayerSummary {
                    id: overlay.id,
                    label,
                    position: format!("x {}, y {}", overlay.x.round(), overlay.y.round()),
                    size: format!("{}px", overlay.font_size),
                    selected: self.active_overlay == Some(overlay.id),
                }
            })
            .collect()
    }
}
