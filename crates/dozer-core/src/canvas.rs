//! The open notepage: its identity, revision and notes.

use crate::api::NotepageInfo;
use crate::note::{Note, RevisionId};
use crate::store::NoteStore;

/// One open notepage.
///
/// The revision id is only ever replaced by a value the server returned.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// Full path name of the notepage (e.g. `/projects/page1`).
    id: String,
    /// Last notepage revision id reported by the server.
    revision_id: RevisionId,
    notes: NoteStore,
}

impl Canvas {
    pub fn new(id: impl Into<String>, revision_id: RevisionId) -> Self {
        Self { id: id.into(), revision_id, notes: NoteStore::new() }
    }

    /// Build the canvas from a notepage record and its listed notes.
    pub fn from_notepage(info: &NotepageInfo, notes: impl IntoIterator<Item = Note>) -> Self {
        Self {
            id: info.full_name.clone(),
            revision_id: info.revision_id,
            notes: notes.into_iter().collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn revision_id(&self) -> RevisionId {
        self.revision_id
    }

    /// Replace the revision id with one returned by the server.
    pub fn adopt_revision(&mut self, revision_id: RevisionId) {
        if revision_id < self.revision_id {
            log::warn!(
                "Notepage {} revision went backwards: {} -> {}",
                self.id,
                self.revision_id,
                revision_id
            );
        }
        self.revision_id = revision_id;
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteStore {
        &mut self.notes
    }
}
