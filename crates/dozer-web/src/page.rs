//! Page conventions shared by the DOM surface and the event wiring.

use dozer_core::api::NotepageInfo;
use dozer_core::{ClientConfig, Note, NoteId};
use serde::Deserialize;

/// Element holding the bootstrap JSON.
pub const BOOTSTRAP_ELEMENT_ID: &str = "notepage-data";
/// Container the notes are drawn into.
pub const VIEWPORT_ELEMENT_ID: &str = "viewport";
/// Button that creates a note.
pub const CREATE_NOTE_ACTION_ID: &str = "createNoteAction";
/// Id of the textarea while a note is being edited.
pub const EDITOR_ELEMENT_ID: &str = "note-edit";

pub const NOTE_CLASS: &str = "note";
pub const SELECTED_CLASS: &str = "selected";

/// Session pump period.
pub const PUMP_INTERVAL_MS: i32 = 50;

const NOTE_ID_PREFIX: &str = "note-";

/// What the server embeds in a notepage view.
#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    pub notepage: NotepageInfo,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub config: Option<ClientConfig>,
}

impl Bootstrap {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

pub fn note_element_id(id: NoteId) -> String {
    format!("{}{}", NOTE_ID_PREFIX, id)
}

/// Parse a note element id back to a note id.
pub fn note_id_from_element_id(element_id: &str) -> Option<NoteId> {
    element_id.strip_prefix(NOTE_ID_PREFIX)?.parse().ok().map(NoteId)
}

/// CSS length in millimetres for a micron quantity.
pub fn css_mm(um: i64) -> String {
    format!("{}mm", um as f64 / 1000.0)
}

pub fn css_px(px: f64) -> String {
    format!("{}px", px)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dozer_core::{MicronVec, RevisionId};

    #[test]
    fn test_note_element_ids() {
        assert_eq!(note_element_id(NoteId(42)), "note-42");
        assert_eq!(note_id_from_element_id("note-42"), Some(NoteId(42)));
        assert_eq!(note_id_from_element_id("note-edit"), None);
        assert_eq!(note_id_from_element_id("viewport"), None);
    }

    #[test]
    fn test_css_lengths() {
        assert_eq!(css_mm(1000), "1mm");
        assert_eq!(css_mm(2500), "2.5mm");
        assert_eq!(css_mm(0), "0mm");
        assert_eq!(css_px(12.0), "12px");
    }

    #[test]
    fn test_bootstrap() {
        let bootstrap = Bootstrap::from_json(
            r#"{
                "notepage": {"node_id": 2, "name": "page1", "full_name": "/page1", "revision_id": 4},
                "notes": [{
                    "node_id": 7, "pos_um": [1000, 0], "size_um": [1000, 1000],
                    "contents_markdown": "hi", "revision_id": 1
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(bootstrap.notepage.revision_id, RevisionId(4));
        assert_eq!(bootstrap.notes[0].pos_um, MicronVec::new(1000, 0));
        assert!(bootstrap.config.is_none());
    }
}
