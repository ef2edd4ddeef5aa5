use crate::app::TaskLost;
use crate::canvas::CanvasError;
use crate::editor::EditorError;
use crate::export::ExportError;
use crate::imaging::ImageLoadError;
use crate::state::StateError;
use crate::template::TemplateError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Image(#[from] ImageLoadError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Task(#[from] TaskLost),
    #[error("{0}")]
    Ui(String),
}
