//! Overlay list, selection and text layout.

pub mod layout;
mod operations;
pub mod overlay;
mod query;

use thiserror::Error;

pub use layout::{FontSpec, TextLayout, TextMeasure};
pub use overlay::{OverlayEdit, TextAlign, TextOverlay};
pub use query::LayerSummary;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("text layer {0} does not exist")]
    OverlayNotFound(u64),
    #[error("no text layer is selected")]
    NoActiveOverlay,
}

/// Ordered overlay list; later entries draw above earlier ones.
#[derive(Debug, Clone)]
pub struct EditorLayers {
    overlays: Vec<TextOverlay>,
    next_id: u64,
    active_overlay: Option<u64>,
}

impl Default for EditorLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorLayers {
    pub fn new() -> Self {
        Self {
            overlays: Vec::new(),
            next_id: 1,
            active_overlay: None,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut TextOverlay> {
        self.overlays.iter_mut().find(|overlay| overlay.id == id)
    }

    pub fn overlays(&self) -> &[TextOverlay] {
        &self.overlays
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}
