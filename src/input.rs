//! Key bindings: arrows and vim-style keys to logical actions.

use crate::game::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Action from a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDropOn,
    SoftDropOff,
    Replay,
    Quit,
    None,
}

impl Action {
    /// Engine command for this action, if the engine handles it.
    pub fn command(self) -> Option<Command> {
        match self {
            Self::MoveLeft => Some(Command::MoveLeft),
            Self::MoveRight => Some(Command::MoveRight),
            Self::Rotate => Some(Command::Rotate),
            Self::SoftDropOn => Some(Command::SoftDropOn),
            Self::SoftDropOff => Some(Command::SoftDropOff),
            Self::Replay | Self::Quit | Self::None => None,
        }
    }

    /// Horizontal moves auto-repeat while held.
    pub fn repeats(self) -> bool {
        matches!(self, Self::MoveLeft | Self::MoveRight)
    }
}

/// Map a key event to an action. Presses and repeats act; releases only end soft drop.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    if kind == KeyEventKind::Release {
        return match code {
            KeyCode::Down | KeyCode::Char('j') => Action::SoftDropOff,
            _ => Action::None,
        };
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Enter => Action::Replay,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDropOn,
        _ => Action::None,
    }
}

/// True if the event ends a held key.
pub fn is_release(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Release
}

/// For a release event, the action the key was holding down.
pub fn released_action(key: KeyEvent) -> Option<Action> {
    is_release(&key).then(|| {
        key_to_action(KeyEvent::new_with_kind(
            key.code,
            key.modifiers,
            KeyEventKind::Press,
        ))
    })
}
