mod dispatch;
mod shortcut;

pub use dispatch::{dispatch, EditorInput, InputOutcome};
pub use shortcut::{resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers};
