//! In-memory surface implementation.

use super::{NotePlacement, Surface};
use crate::note::{Note, NoteId};
use kurbo::{Point, Size};
use std::collections::{BTreeSet, HashMap};

/// What the surface currently shows for one note.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnNote {
    pub offset_px: Point,
    pub size_px: Size,
    pub z_index: i64,
    pub html: String,
    /// Rendered content is hidden while an editor is open.
    pub content_hidden: bool,
}

/// In-memory surface for testing and headless use.
///
/// Offsets are stored as whole pixels, like a real layout engine reports
/// them.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    notes: HashMap<NoteId, DrawnNote>,
    editor: Option<(NoteId, String)>,
    selected: BTreeSet<NoteId>,
    draws: usize,
}

impl MemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drawn(&self, id: NoteId) -> Option<&DrawnNote> {
        self.notes.get(&id)
    }

    /// The open editor's note and text.
    pub fn editor(&self) -> Option<(NoteId, &str)> {
        self.editor.as_ref().map(|(id, text)| (*id, text.as_str()))
    }

    /// Replace the editor text, as typing would.
    pub fn type_into_editor(&mut self, text: &str) {
        if let Some((_, current)) = self.editor.as_mut() {
            *current = text.to_string();
        }
    }

    pub fn is_selected(&self, id: NoteId) -> bool {
        self.selected.contains(&id)
    }

    /// Number of `draw_note` calls so far.
    pub fn draw_count(&self) -> usize {
        self.draws
    }
}

impl Surface for MemorySurface {
    fn draw_note(&mut self, note: &Note, placement: &NotePlacement, html: &str) {
        self.draws += 1;
        let editing = matches!(&self.editor, Some((id, _)) if *id == note.id);
        self.notes.insert(
            note.id,
            DrawnNote {
                offset_px: Point::new(placement.offset_px.x.trunc(), placement.offset_px.y.trunc()),
                size_px: placement.size_px,
                z_index: note.z_index,
                html: html.to_string(),
                content_hidden: editing,
            },
        );
    }

    fn note_offset_px(&self, id: NoteId) -> Option<Point> {
        self.notes.get(&id).map(|n| n.offset_px)
    }

    fn set_note_offset_px(&mut self, id: NoteId, offset: Point) {
        if let Some(drawn) = self.notes.get_mut(&id) {
            drawn.offset_px = Point::new(offset.x.trunc(), offset.y.trunc());
        }
    }

    fn open_editor(&mut self, id: NoteId, raw: &str) {
        if let Some(drawn) = self.notes.get_mut(&id) {
            drawn.content_hidden = true;
        }
        self.editor = Some((id, raw.to_string()));
    }

    fn close_editor(&mut self, id: NoteId) -> Option<String> {
        match self.editor.take() {
            Some((open, text)) if open == id => {
                if let Some(drawn) = self.notes.get_mut(&id) {
                    drawn.content_hidden = false;
                }
                Some(text)
            }
            other => {
                self.editor = other;
                None
            }
        }
    }

    fn set_selected(&mut self, id: NoteId, selected: bool) {
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::RevisionId;
    use crate::transform::{Calibration, MicronVec};

    fn note(id: i64) -> Note {
        Note {
            id: NoteId(id),
            name: String::new(),
            pos_um: MicronVec::new(10, 20),
            size_um: MicronVec::new(1000, 1000),
            z_index: 3,
            contents_markdown: "hello".into(),
            revision_id: RevisionId(1),
        }
    }

    #[test]
    fn test_draw_truncates_offsets() {
        let calibration = Calibration::from_ratio(0.15).unwrap();
        let mut surface = MemorySurface::new();
        let n = note(1);
        surface.draw_note(&n, &NotePlacement::for_note(&n, &calibration), "<p>hello</p>\n");
        let drawn = surface.drawn(NoteId(1)).unwrap();
        assert_eq!(drawn.offset_px, Point::new(1.0, 3.0));
        assert_eq!(drawn.z_index, 3);
        assert_eq!(surface.draw_count(), 1);
    }

    #[test]
    fn test_editor_lifecycle() {
        let calibration = Calibration::from_ratio(1.0).unwrap();
        let mut surface = MemorySurface::new();
        let n = note(1);
        surface.draw_note(&n, &NotePlacement::for_note(&n, &calibration), "");

        surface.open_editor(NoteId(1), "hello");
        assert!(surface.drawn(NoteId(1)).unwrap().content_hidden);
        surface.type_into_editor("hello world");
        assert_eq!(surface.close_editor(NoteId(2)), None);
        assert_eq!(surface.close_editor(NoteId(1)).as_deref(), Some("hello world"));
        assert!(!surface.drawn(NoteId(1)).unwrap().content_hidden);
        assert!(surface.editor().is_none());
    }

    #[test]
    fn test_selection_marks() {
        let mut surface = MemorySurface::new();
        surface.set_selected(NoteId(4), true);
        assert!(surface.is_selected(NoteId(4)));
        surface.set_selected(NoteId(4), false);
        assert!(!surface.is_selected(NoteId(4)));
    }
}
