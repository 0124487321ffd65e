//! Presentation surface and markup rendering.
//!
//! The core never touches a real display. It supplies geometry and rendered
//! HTML to a [`Surface`] and reads raw pixel offsets back from it.

mod markdown;
mod memory;

pub use markdown::MarkdownRenderer;
pub use memory::{DrawnNote, MemorySurface};

use crate::note::{Note, NoteId};
use crate::transform::Calibration;
use kurbo::{Point, Size};

/// Where a note is drawn, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotePlacement {
    pub offset_px: Point,
    pub size_px: Size,
}

impl NotePlacement {
    pub fn for_note(note: &Note, calibration: &Calibration) -> Self {
        Self {
            offset_px: calibration.um_to_px(note.pos_um),
            size_px: calibration.size_to_px(note.size_um),
        }
    }
}

/// The presentation layer a notepage draws into.
pub trait Surface {
    /// Create or update the visible note: geometry, z-order and content.
    fn draw_note(&mut self, note: &Note, placement: &NotePlacement, html: &str);

    /// The note's current on-screen offset, as whole pixels.
    fn note_offset_px(&self, id: NoteId) -> Option<Point>;

    /// Move the note on screen without touching the model.
    fn set_note_offset_px(&mut self, id: NoteId, offset: Point);

    /// Hide the rendered content and show an editor seeded with `raw`.
    fn open_editor(&mut self, id: NoteId, raw: &str);

    /// Discard the editor, returning its text.
    fn close_editor(&mut self, id: NoteId) -> Option<String>;

    fn set_selected(&mut self, id: NoteId, selected: bool);
}

/// Turns note markup into sanitized HTML. Must be free of side effects.
pub trait MarkupRenderer {
    fn render(&self, markup: &str) -> String;
}
