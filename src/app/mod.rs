//! The editor controller: sole owner of overlays, selection, image and status.

mod task;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::canvas::{FontBook, MemeCanvas};
use crate::config::AppConfig;
use crate::editor::{EditorLayers, LayerSummary, OverlayEdit, TextOverlay};
use crate::error::{AppError, AppResult};
use crate::export::ExportService;
use crate::geometry::{CanvasPoint, CanvasSize};
use crate::imaging::{self, LoadedImage};
use crate::state::{AppEvent, AppState, Operation, StateMachine};
use crate::template::{HttpCatalogClient, Template, TemplateSource};

pub use task::{task_outcome, TaskLost, WorkerTask};

pub const READY_STATUS: &str = "Ready. Upload an image or choose a random template.";
pub const EXPORT_COMPLETE_STATUS: &str = "Export complete.";
const FIRST_LAYER_TEXT: &str = "Top text";
const NEXT_LAYER_TEXT: &str = "More text";

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    overlay_id: u64,
    offset_x: f64,
    offset_y: f64,
}

#[derive(Debug)]
pub struct MemeEditor {
    canvas: MemeCanvas,
    layers: EditorLayers,
    drag: Option<DragState>,
    state: StateMachine,
    status: String,
    templates: Arc<TemplateSource>,
    exporter: ExportService,
}

impl MemeEditor {
    pub fn new(canvas: MemeCanvas, templates: Arc<TemplateSource>, exporter: ExportService) -> Self {
        let mut editor = Self {
            canvas,
            layers: EditorLayers::new(),
            drag: None,
            state: StateMachine::new(),
            status: READY_STATUS.to_string(),
            templates,
            exporter,
        };
        editor.redraw();
        editor
    }

    /// Builds an editor with system fonts, the HTTP catalog and the configured
    /// export directory.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let canvas = MemeCanvas::new(FontBook::with_system_fonts(), config.max_dimension())?;
        let templates = TemplateSource::new(
            Box::new(HttpCatalogClient::new()?),
            config.template_endpoints(),
        );
        let exporter = match config.export_dir() {
            Some(dir) => ExportService::with_dir(dir.to_path_buf()),
            None => ExportService::with_default_dir()?,
        };
        Ok(Self::new(canvas, Arc::new(templates), exporter))
    }

    pub fn canvas(&self) -> &MemeCanvas {
        &self.canvas
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas.size()
    }

    pub fn layers(&self) -> &EditorLayers {
        &self.layers
    }

    pub fn active_overlay(&self) -> Option<&TextOverlay> {
        self.layers.active()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn state(&self) -> AppState {
        self.state.state()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn templates(&self) -> Arc<TemplateSource> {
        Arc::clone(&self.templates)
    }

    pub fn exporter(&self) -> &ExportService {
        &self.exporter
    }

    pub fn max_dimension(&self) -> u32 {
        self.canvas.max_dimension()
    }

    fn set_status(&mut self, message: &str) {
        self.status = one_line(message);
        tracing::debug!(status = %self.status, "status updated");
    }

    fn redraw(&mut self) {
        self.canvas.draw(&self.layers);
    }

    pub fn add_text(&mut self) -> u64 {
        let text = if self.layers.is_empty() {
            FIRST_LAYER_TEXT
        } else {
            NEXT_LAYER_TEXT
        };
        let id = self.layers.add_overlay(self.canvas.size(), Some(text));
        self.redraw();
        id
    }

    /// Returns false when nothing was selected.
    pub fn delete_active(&mut self) -> bool {
        let Some(removed) = self.layers.remove_active() else {
            return false;
        };
        if self.drag.is_some_and(|drag| drag.overlay_id == removed.id) {
            self.drag = None;
        }
        self.redraw();
        true
    }

    pub fn select(&mut self, id: Option<u64>) -> AppResult<()> {
        self.layers.select(id)?;
        self.redraw();
        Ok(())
    }

    pub fn edit_active(&mut self, edit: OverlayEdit) -> AppResult<()> {
        self.layers.edit_active(edit, self.canvas.size())?;
        self.redraw();
        Ok(())
    }

    /// Selects the top-most overlay under `point` and starts dragging it, or
    /// clears the selection on a miss. Returns the hit overlay id.
    pub fn pointer_down(&mut self, point: CanvasPoint) -> Option<u64> {
        let hit = self
            .layers
            .top_most_at(point, self.canvas.size().width, self.canvas.fonts())
            .and_then(|id| self.layers.get(id))
            .map(|overlay| (overlay.id, overlay.anchor()));

        match hit {
            Some((id, anchor)) => {
                self.drag = Some(DragState {
                    overlay_id: id,
                    offset_x: anchor.x - point.x,
                    offset_y: anchor.y - point.y,
                });
                self.active_or_clear(Some(id));
                Some(id)
            }
            None => {
                self.drag = None;
                self.active_or_clear(None);
                None
            }
        }
    }

    fn active_or_clear(&mut self, id: Option<u64>) {
        if let Err(err) = self.layers.select(id) {
            tracing::warn!(%err, "pointer selection failed");
        }
        self.redraw();
    }

    /// Moves the dragged overlay so it keeps its grab offset. Returns false
    /// when no drag is in progress.
    pub fn pointer_move(&mut self, point: CanvasPoint) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let anchor = CanvasPoint::new(point.x + drag.offset_x, point.y + drag.offset_y);
        match self
            .layers
            .move_overlay_to(drag.overlay_id, anchor, self.canvas.size())
        {
            Ok(()) => {
                self.redraw();
                true
            }
            Err(err) => {
                tracing::warn!(%err, "dragged text layer disappeared");
                self.drag = None;
                false
            }
        }
    }

    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Enters the busy state for `operation`; refused while another runs.
    pub fn begin_operation(&mut self, operation: Operation) -> AppResult<()> {
        self.state.transition(AppEvent::Begin(operation))?;
        self.set_status(operation.busy_message());
        Ok(())
    }

    fn finish_operation(&mut self) {
        self.state.reset();
    }

    fn fail_operation(&mut self, operation: Operation, err: &AppError) {
        tracing::warn!(?operation, %err, "operation failed");
        self.set_status(&format!("{}: {err}", operation.failure_prefix()));
    }

    fn apply_image(&mut self, image: LoadedImage) -> AppResult<CanvasSize> {
        let size = self.canvas.set_image(Some(image))?;
        self.layers.fit_to_canvas(size);
        self.redraw();
        Ok(size)
    }

    fn loaded_status(size: CanvasSize) -> String {
        format!("Image loaded ({}×{}).", size.width, size.height)
    }

    pub fn finish_upload(&mut self, result: AppResult<LoadedImage>) -> AppResult<()> {
        let outcome = result.and_then(|image| self.apply_image(image));
        let outcome = match outcome {
            Ok(size) => {
                self.set_status(&Self::loaded_status(size));
                Ok(())
            }
            Err(err) => {
                self.fail_operation(Operation::Upload, &err);
                Err(err)
            }
        };
        self.finish_operation();
        outcome
    }

    pub fn finish_random_template(
        &mut self,
        result: AppResult<(Template, LoadedImage)>,
    ) -> AppResult<()> {
        let outcome = result.and_then(|(template, image)| {
            let size = self.apply_image(image)?;
            Ok((template, size))
        });
        let outcome = match outcome {
            Ok((template, size)) => {
                tracing::info!(id = %template.id, ?size, "applied template");
                self.set_status(&format!("Template: {}", template.name));
                Ok(())
            }
            Err(err) => {
                self.fail_operation(Operation::RandomTemplate, &err);
                Err(err)
            }
        };
        self.finish_operation();
        outcome
    }

    pub fn finish_export(&mut self, result: AppResult<PathBuf>) -> AppResult<PathBuf> {
        let outcome = match result {
            Ok(path) => {
                self.set_status(EXPORT_COMPLETE_STATUS);
                Ok(path)
            }
            Err(err) => {
                self.fail_operation(Operation::Export, &err);
                Err(err)
            }
        };
        self.finish_operation();
        outcome
    }

    pub fn upload_file(&mut self, path: &Path) -> AppResult<()> {
        self.begin_operation(Operation::Upload)?;
        let result = imaging::load_file(path, self.max_dimension()).map_err(AppError::from);
        self.finish_upload(result)
    }

    pub fn upload_bytes(&mut self, bytes: &[u8]) -> AppResult<()> {
        self.begin_operation(Operation::Upload)?;
        let result = imaging::decode_bytes(bytes, self.max_dimension()).map_err(AppError::from);
        self.finish_upload(result)
    }

    pub fn random_template(&mut self) -> AppResult<()> {
        self.begin_operation(Operation::RandomTemplate)?;
        let result = fetch_random_template_image(&self.templates, self.max_dimension());
        self.finish_random_template(result)
    }

    pub fn export_png(&mut self) -> AppResult<PathBuf> {
        self.begin_operation(Operation::Export)?;
        let result = self
            .exporter
            .save_png(self.canvas.pixmap(), None)
            .map_err(AppError::from);
        self.finish_export(result)
    }

    pub fn layer_summaries(&self) -> Vec<LayerSummary> {
        self.layers.summaries()
    }
}

/// Picks a template and downloads its blank image. Safe to run off the UI thread.
pub fn fetch_random_template_image(
    templates: &TemplateSource,
    max_dimension: u32,
) -> AppResult<(Template, LoadedImage)> {
    let template = templates.random_template()?;
    let bytes = templates.fetch_image_bytes(&template.blank)?;
    let image = imaging::decode_bytes(&bytes, max_dimension)?;
    Ok((template, image))
}

/// Collapses whitespace runs to single spaces and trims.
pub fn one_line(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::canvas::FALLBACK_SIZE;
    use crate::geometry::Color;

    #[test]
    fn starts_ready_and_idle() {
        let editor = editor();
        assert_eq!(editor.status(), READY_STATUS);
        assert_eq!(editor.state(), AppState::Idle);
        assert_eq!(editor.canvas_size(), FALLBACK_SIZE);
        assert!(editor.layers().is_empty());
    }

    #[test]
    fn add_text_names_first_and_following_layers() {
        let mut editor = editor();
        let first = editor.add_text();
        let second = editor.add_text();
        let overlays = editor.layers().overlays();
        assert_eq!(overlays[0].text, "Top text");
        assert_eq!(overlays[1].text, "More text");
        assert_eq!(overlays[1].y, 127.0);
        assert_ne!(first, second);
        assert_eq!(editor.active_overlay().map(|o| o.id), Some(second));
    }

    #[test]
    fn delete_active_selects_last_remaining_layer() {
        let mut editor = editor();
        assert!(!editor.delete_active());

        let first = editor.add_text();
        let second = editor.add_text();
        let third = editor.add_text();
        editor.select(Some(second)).expect("select");
        assert!(editor.delete_active());
        assert_eq!(editor.active_overlay().map(|o| o.id), Some(third));

        editor.select(Some(first)).expect("select");
        editor.delete_active();
        editor.delete_active();
        assert!(editor.layers().is_empty());
        assert!(editor.active_overlay().is_none());
    }

    #[test]
    fn pointer_drag_keeps_grab_offset_and_clamps() {
        let mut editor = editor();
        let id = editor.add_text();
        editor.select(None).expect("clear");

        let grab = CanvasPoint::new(410.0, 80.0);
        assert_eq!(editor.pointer_down(grab), Some(id));
        assert_eq!(editor.active_overlay().map(|o| o.id), Some(id));
        assert!(editor.is_dragging());

        assert!(editor.pointer_move(CanvasPoint::new(510.0, 180.0)));
        let overlay = editor.active_overlay().expect("active");
        assert_eq!((overlay.x, overlay.y), (500.0, 168.0));

        editor.pointer_move(CanvasPoint::new(5000.0, -300.0));
        let overlay = editor.active_overlay().expect("active");
        assert_eq!((overlay.x, overlay.y), (800.0, 0.0));

        assert!(editor.end_drag());
        assert!(!editor.pointer_move(CanvasPoint::new(10.0, 10.0)));
    }

    #[test]
    fn pointer_down_on_empty_area_clears_selection() {
        let mut editor = editor();
        editor.add_text();
        assert_eq!(editor.pointer_down(CanvasPoint::new(5.0, 440.0)), None);
        assert!(editor.active_overlay().is_none());
        assert!(!editor.is_dragging());
    }

    #[test]
    fn pointer_down_prefers_the_top_most_overlay() {
        let mut editor = editor();
        let lower = editor.add_text();
        let upper = editor.add_text();
        editor
            .layers
            .move_overlay_to(lower, CanvasPoint::new(400.0, 100.0), editor.canvas_size())
            .expect("move");
        editor
            .layers
            .move_overlay_to(upper, CanvasPoint::new(400.0, 100.0), editor.canvas_size())
            .expect("move");
        assert_eq!(editor.pointer_down(CanvasPoint::new(400.0, 120.0)), Some(upper));
    }

    #[test]
    fn edit_active_requires_selection() {
        let mut editor = editor();
        editor.add_text();
        editor
            .edit_active(OverlayEdit::StrokeColor(Color::new(10, 20, 30)))
            .expect("edit");
        assert_eq!(
            editor.active_overlay().map(|o| o.stroke_color),
            Some(Color::new(10, 20, 30))
        );
        editor.select(None).expect("clear");
        assert!(editor.edit_active(OverlayEdit::FontSize(30.0)).is_err());
    }

    #[test]
    fn second_operation_is_refused_while_busy() {
        let mut editor = editor();
        editor.begin_operation(Operation::Upload).expect("begin");
        assert_eq!(editor.status(), "Loading uploaded image…");
        let err = editor
            .begin_operation(Operation::RandomTemplate)
            .expect_err("busy");
        assert!(matches!(err, AppError::State(ref state) if state.is_busy()));
        assert_eq!(editor.state(), AppState::Busy(Operation::Upload));

        editor
            .finish_upload(imaging::decode_bytes(&png_bytes(64, 32), 1600).map_err(AppError::from))
            .expect("finish");
        assert_eq!(editor.state(), AppState::Idle);
        assert_eq!(editor.status(), "Image loaded (64×32).");
    }

    #[test]
    fn upload_resizes_canvas_and_refits_layers() {
        let mut editor = editor();
        let id = editor.add_text();
        editor.upload_bytes(&png_bytes(3200, 1000)).expect("upload");
        assert_eq!(editor.canvas_size(), CanvasSize::new(1600, 500));
        let overlay = editor.layers().get(id).expect("overlay");
        assert_eq!(overlay.max_width, Some(1472.0));
        assert_eq!(editor.status(), "Image loaded (1600×500).");
    }

    #[test]
    fn failed_upload_reports_and_returns_to_idle() {
        let mut editor = editor();
        assert!(editor.upload_bytes(b"not an image").is_err());
        assert!(editor.status().starts_with("Upload failed: Failed to load image"));
        assert_eq!(editor.state(), AppState::Idle);
        assert_eq!(editor.canvas_size(), FALLBACK_SIZE);
    }

    #[test]
    fn random_template_applies_image_and_names_it() {
        let mut editor = editor_with_client(catalog_client());
        editor.random_template().expect("template");
        assert_eq!(editor.status(), "Template: Drakeposting");
        assert_eq!(editor.canvas_size(), CanvasSize::new(320, 200));
        assert!(editor.canvas().has_image());
    }

    #[test]
    fn random_template_failure_is_reported() {
        let mut editor = editor();
        assert!(editor.random_template().is_err());
        assert!(editor.status().starts_with("Random template failed: "));
        assert_eq!(editor.state(), AppState::Idle);
    }

    #[test]
    fn export_writes_png_and_reports_completion() {
        let mut editor = editor();
        editor.add_text();
        let path = editor.export_png().expect("export");
        assert_eq!(editor.status(), EXPORT_COMPLETE_STATUS);
        let decoded = image::open(&path).expect("exported png decodes");
        assert_eq!((decoded.width(), decoded.height()), (800, 450));
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn one_line_collapses_whitespace() {
        assert_eq!(
            one_line("  Upload failed:\n  bad\tdata  "),
            "Upload failed: bad data"
        );
        assert_eq!(one_line(""), "");
    }
}
