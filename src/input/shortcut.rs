#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
    Delete,
    Backspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self { ctrl, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    /// A text field of the layer form has keyboard focus.
    pub text_field_focused: bool,
    pub busy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    DeleteActive,
    ClearSelection,
    AddText,
    Export,
    Upload,
    RandomTemplate,
}

fn resolve_command_shortcut(key: ShortcutKey, modifiers: ShortcutModifiers) -> Option<ShortcutAction> {
    match (key, modifiers.shift) {
        (ShortcutKey::Character('s'), false) | (ShortcutKey::Character('e'), false) => {
            Some(ShortcutAction::Export)
        }
        (ShortcutKey::Character('o'), false) => Some(ShortcutAction::Upload),
        (ShortcutKey::Character('r'), false) => Some(ShortcutAction::RandomTemplate),
        (ShortcutKey::Character('t'), false) | (ShortcutKey::Enter, false) => {
            Some(ShortcutAction::AddText)
        }
        _ => None,
    }
}

pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if modifiers.ctrl {
        // Command shortcuts mirror the toolbar, which is disabled while busy.
        if context.busy {
            return None;
        }
        return resolve_command_shortcut(key, modifiers);
    }

    if context.text_field_focused {
        return None;
    }

    match (key, modifiers.shift) {
        (ShortcutKey::Delete, false) | (ShortcutKey::Backspace, false) => {
            Some(ShortcutAction::DeleteActive)
        }
        (ShortcutKey::Escape, _) => Some(ShortcutAction::ClearSelection),
        _ => None,
    }
}
