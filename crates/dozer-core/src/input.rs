//! Pointer and keyboard events, and the configurable key bindings.

use crate::note::NoteId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Map a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Left),
            1 => Some(Self::Middle),
            2 => Some(Self::Right),
            _ => None,
        }
    }
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { shift: false, ctrl: false, alt: false, meta: false };

    pub fn shift() -> Self {
        Self { shift: true, ..Self::NONE }
    }

    pub fn alt() -> Self {
        Self { alt: true, ..Self::NONE }
    }

    pub fn meta() -> Self {
        Self { meta: true, ..Self::NONE }
    }

    /// Whether every modifier held in `required` is held here.
    pub fn contains(&self, required: Modifiers) -> bool {
        (!required.shift || self.shift)
            && (!required.ctrl || self.ctrl)
            && (!required.alt || self.alt)
            && (!required.meta || self.meta)
    }

    pub fn has(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Shift => self.shift,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
            ModifierKey::Meta => self.meta,
        }
    }
}

/// A single modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKey {
    Shift,
    Ctrl,
    Alt,
    Meta,
}

/// What a pointer event landed on, as reported by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTarget {
    /// Empty canvas background.
    Canvas,
    /// A note's own background.
    Note(NoteId),
    /// An interactive child control inside a note (link, button, editor).
    NoteControl(NoteId),
}

impl HitTarget {
    pub fn note(&self) -> Option<NoteId> {
        match self {
            Self::Canvas => None,
            Self::Note(id) | Self::NoteControl(id) => Some(*id),
        }
    }
}

/// Pointer events in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        target: HitTarget,
    },
    Move {
        position: Point,
        /// Whether the primary button is still held.
        primary_held: bool,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Click {
        position: Point,
        button: MouseButton,
        target: HitTarget,
        modifiers: Modifiers,
    },
    DoubleClick {
        position: Point,
        target: HitTarget,
    },
}

/// A logical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Enter,
    Escape,
    Character(String),
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    ///
    /// A bare line feed is the Enter variant some platforms report with a
    /// modifier held.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" | "\n" | "\r" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            k if k.chars().count() == 1 => Self::Character(k.to_string()),
            k => Self::Other(k.to_string()),
        }
    }
}

/// A key press with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// A key plus the modifiers that must be held with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Extra modifiers beyond the required ones do not prevent a match.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.key && event.modifiers.contains(self.modifiers)
    }

    /// Whether one key press can match both chords: same key, and one
    /// chord's modifiers include the other's.
    pub fn overlaps(&self, other: &KeyChord) -> bool {
        self.key == other.key
            && (self.modifiers.contains(other.modifiers) || other.modifiers.contains(self.modifiers))
    }
}

/// Key and modifier bindings for the interaction state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Chords that commit an edit.
    pub commit: Vec<KeyChord>,
    /// Chords that cancel an edit.
    pub cancel: Vec<KeyChord>,
    /// Held while clicking to add a note to the selection.
    pub add: ModifierKey,
    /// Held while clicking to remove a note from the selection.
    pub subtract: ModifierKey,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            commit: vec![
                KeyChord::new(Key::Enter, Modifiers::alt()),
                KeyChord::new(Key::Enter, Modifiers::meta()),
            ],
            cancel: vec![KeyChord::new(Key::Escape, Modifiers::NONE)],
            add: ModifierKey::Shift,
            subtract: ModifierKey::Alt,
        }
    }
}

impl KeyBindings {
    pub fn is_commit(&self, event: &KeyEvent) -> bool {
        self.commit.iter().any(|chord| chord.matches(event))
    }

    pub fn is_cancel(&self, event: &KeyEvent) -> bool {
        self.cancel.iter().any(|chord| chord.matches(event))
    }

    /// A commit chord that some key press would also match as a cancel.
    pub fn conflicts(&self) -> Option<&KeyChord> {
        self.commit
            .iter()
            .find(|commit| self.cancel.iter().any(|cancel| commit.overlaps(cancel)))
    }
}
