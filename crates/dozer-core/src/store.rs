//! Note entity store for one open notepage.

use crate::note::{Note, NoteId};
use crate::sync::NoteResult;
use std::collections::HashMap;

/// Owns every note record of the open notepage, keyed by id.
///
/// Mutation is always whole-record replacement.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: HashMap<NoteId, Note>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a note by id. Returns the previous record.
    pub fn upsert(&mut self, note: Note) -> Option<Note> {
        self.notes.insert(note.id, note)
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.notes.contains_key(&id)
    }

    /// Notes in listing order (by name, then id).
    pub fn all(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.values().collect();
        notes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        notes
    }

    /// Notes back to front (ascending z-index, ties by id).
    pub fn paint_order(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.values().collect();
        notes.sort_by_key(|n| (n.z_index, n.id));
        notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Merge server-reported fields into the stored note.
    ///
    /// Fields absent from `result` keep their stored value. Returns the
    /// merged record, or `None` if the note is not in the store.
    pub fn merge(&mut self, result: &NoteResult) -> Option<&Note> {
        let current = self.notes.get(&result.note_id)?;
        let mut merged = current.clone();
        if let Some(pos) = result.pos_um {
            merged.pos_um = pos;
        }
        if let Some(size) = result.size_um {
            merged.size_um = size;
        }
        if let Some(z) = result.z_index {
            merged.z_index = z;
        }
        if let Some(contents) = &result.contents_markdown {
            merged.contents_markdown = contents.clone();
        }
        if let Some(revision) = result.revision_id {
            merged.revision_id = revision;
        }
        self.notes.insert(merged.id, merged);
        self.notes.get(&result.note_id)
    }
}

impl FromIterator<Note> for NoteStore {
    fn from_iter<I: IntoIterator<Item = Note>>(iter: I) -> Self {
        let mut store = Self::new();
        for note in iter {
            store.upsert(note);
        }
        store
    }
}
