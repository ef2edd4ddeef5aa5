use crate::app::MemeEditor;
use crate::editor::OverlayEdit;
use crate::geometry::{CanvasPoint, DisplayRect};

/// User intents coming from the shell, in client (widget) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorInput {
    PointerDown {
        client: CanvasPoint,
        display: DisplayRect,
    },
    PointerMove {
        client: CanvasPoint,
        display: DisplayRect,
    },
    PointerUp,
    PointerCancel,
    AddText,
    DeleteActive,
    SelectLayer(u64),
    ClearSelection,
    Edit(OverlayEdit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Unchanged,
    Redrawn,
}

impl InputOutcome {
    pub const fn redrawn(self) -> bool {
        matches!(self, Self::Redrawn)
    }

    const fn from_redraw(redrawn: bool) -> Self {
        if redrawn {
            Self::Redrawn
        } else {
            Self::Unchanged
        }
    }
}

/// Maps one intent onto one controller command.
pub fn dispatch(editor: &mut MemeEditor, input: EditorInput) -> InputOutcome {
    match input {
        EditorInput::PointerDown { client, display } => {
            let point = editor.canvas().client_to_canvas(client, display);
            editor.pointer_down(point);
            InputOutcome::Redrawn
        }
        EditorInput::PointerMove { client, display } => {
            let point = editor.canvas().client_to_canvas(client, display);
            InputOutcome::from_redraw(editor.pointer_move(point))
        }
        EditorInput::PointerUp | EditorInput::PointerCancel => {
            editor.end_drag();
            InputOutcome::Unchanged
        }
        EditorInput::AddText => {
            editor.add_text();
            InputOutcome::Redrawn
        }
        EditorInput::DeleteActive => InputOutcome::from_redraw(editor.delete_active()),
        EditorInput::SelectLayer(id) => match editor.select(Some(id)) {
            Ok(()) => InputOutcome::Redrawn,
            Err(err) => {
                tracing::warn!(%err, "layer selection ignored");
                InputOutcome::Unchanged
            }
        },
        EditorInput::ClearSelection => match editor.select(None) {
            Ok(()) => InputOutcome::Redrawn,
            Err(err) => {
                tracing::warn!(%err, "clearing selection failed");
                InputOutcome::Unchanged
            }
        },
        EditorInput::Edit(edit) => match editor.edit_active(edit) {
            Ok(()) => InputOutcome::Redrawn,
            Err(err) => {
                tracing::debug!(%err, "edit ignored");
                InputOutcome::Unchanged
            }
        },
    }
}
