//! Note records and partial updates.

use crate::transform::MicronVec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable server-assigned node id of a note.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned revision id. Never computed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(pub i64);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A positioned markdown note on a notepage.
///
/// Decodes from the server's node JSON; fields the client does not use
/// (`class`, `full_name`, permissions) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "node_id")]
    pub id: NoteId,
    #[serde(default)]
    pub name: String,
    pub pos_um: MicronVec,
    pub size_um: MicronVec,
    #[serde(default)]
    pub z_index: i64,
    #[serde(default)]
    pub contents_markdown: String,
    pub revision_id: RevisionId,
}

impl Note {
    /// The record with `patch` applied. The revision id is unchanged.
    pub fn with_patch(&self, patch: &NotePatch) -> Note {
        Note {
            pos_um: patch.pos_um.unwrap_or(self.pos_um),
            size_um: patch.size_um.unwrap_or(self.size_um),
            contents_markdown: patch
                .contents_markdown
                .clone()
                .unwrap_or_else(|| self.contents_markdown.clone()),
            ..self.clone()
        }
    }
}

/// Fields a client may change on a note. Absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_um: Option<MicronVec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_um: Option<MicronVec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents_markdown: Option<String>,
}

impl NotePatch {
    pub fn position(pos_um: MicronVec) -> Self {
        Self { pos_um: Some(pos_um), ..Self::default() }
    }

    pub fn contents(contents_markdown: impl Into<String>) -> Self {
        Self { contents_markdown: Some(contents_markdown.into()), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.pos_um.is_none() && self.size_um.is_none() && self.contents_markdown.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server_note() -> serde_json::Value {
        json!({
            "class": "Note",
            "node_id": 7,
            "name": "6f1c0d9e",
            "full_name": "/page1/6f1c0d9e",
            "path_components": ["page1", "6f1c0d9e"],
            "inherit_permissions": true,
            "z_index": 0,
            "contents_markdown": "",
            "pos_um": [0, 0],
            "size_um": [1000, 1000],
            "revision_id": 1,
        })
    }

    #[test]
    fn test_decode_server_note() {
        let note: Note = serde_json::from_value(server_note()).unwrap();
        assert_eq!(note.id, NoteId(7));
        assert_eq!(note.size_um, MicronVec::new(1000, 1000));
        assert_eq!(note.revision_id, RevisionId(1));
    }

    #[test]
    fn test_with_patch_keeps_revision() {
        let note: Note = serde_json::from_value(server_note()).unwrap();
        let moved = note.with_patch(&NotePatch::position(MicronVec::new(25, 25)));
        assert_eq!(moved.pos_um, MicronVec::new(25, 25));
        assert_eq!(moved.size_um, note.size_um);
        assert_eq!(moved.revision_id, note.revision_id);

        let edited = note.with_patch(&NotePatch::contents("# hi"));
        assert_eq!(edited.contents_markdown, "# hi");
        assert_eq!(edited.pos_um, note.pos_um);
    }

    #[test]
    fn test_patch_omits_absent_fields() {
        let patch = NotePatch::position(MicronVec::new(1, 2));
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"pos_um": [1, 2]}));
        assert!(NotePatch::default().is_empty());
    }
}
