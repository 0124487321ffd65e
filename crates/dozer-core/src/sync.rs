//! Sync engine: submits note mutation batches and applies the results.
//!
//! Each interaction commit becomes exactly one `update_notepage` call with
//! its own batch. Completed batches are reported as [`SyncEvent`]s from
//! [`SyncEngine::poll`].

use crate::api::Api;
use crate::canvas::Canvas;
use crate::error::InputError;
use crate::note::{NoteId, NotePatch, RevisionId};
use crate::rpc::{RpcClient, RpcError, TypedCall};
use crate::transform::MicronVec;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};

/// Edit one note, guarded by the revision the client last saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditNote {
    pub note_id: NoteId,
    pub revision_id: RevisionId,
    #[serde(flatten)]
    pub patch: NotePatch,
}

/// One directive in an update batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NoteOperation {
    EditNote(EditNote),
}

impl NoteOperation {
    pub fn note_id(&self) -> NoteId {
        match self {
            Self::EditNote(edit) => edit.note_id,
        }
    }
}

/// Server-reported state of one note after a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteResult {
    pub note_id: NoteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_um: Option<MicronVec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_um: Option<MicronVec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents_markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<RevisionId>,
}

/// Result of `update_notepage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateNotepageResult {
    pub notepage_revision_id: RevisionId,
    #[serde(default)]
    pub results: Vec<NoteResult>,
}

/// Identifies one submitted batch within a session.
pub type BatchId = u64;

/// Which notes a merged batch touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub updated: Vec<NoteId>,
    /// Reported by the server but not in the local store.
    pub skipped: Vec<NoteId>,
}

/// Events from the sync engine and session.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A batch was accepted and merged.
    BatchApplied {
        batch: BatchId,
        revision_id: RevisionId,
        updated: Vec<NoteId>,
        skipped: Vec<NoteId>,
    },
    /// A batch failed. Optimistic local state is left as it is.
    BatchFailed { batch: BatchId, error: RpcError },
    /// A note created through the session arrived from the server.
    NoteCreated { note_id: NoteId },
    /// Some other call failed.
    CallFailed { method: String, error: RpcError },
}

/// Merge an update result into the canvas.
///
/// The canvas adopts the returned revision verbatim; notes missing from the
/// store are skipped.
pub fn apply_update(canvas: &mut Canvas, result: &UpdateNotepageResult) -> ApplyReport {
    canvas.adopt_revision(result.notepage_revision_id);

    let mut report = ApplyReport::default();
    for note_result in &result.results {
        if canvas.notes_mut().merge(note_result).is_some() {
            report.updated.push(note_result.note_id);
        } else {
            log::debug!(
                "Skipping result for note {} not present on {}",
                note_result.note_id,
                canvas.id()
            );
            report.skipped.push(note_result.note_id);
        }
    }
    report
}

struct InFlightBatch {
    id: BatchId,
    canvas_id: String,
    call: TypedCall<UpdateNotepageResult>,
}

/// Tracks submitted batches until they resolve.
#[derive(Default)]
pub struct SyncEngine {
    next_batch: BatchId,
    in_flight: Vec<InFlightBatch>,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit one batch as a single `update_notepage` call.
    pub fn submit<T: Transport>(
        &mut self,
        client: &mut RpcClient<T>,
        api: &Api,
        canvas_id: &str,
        operations: Vec<NoteOperation>,
    ) -> Result<BatchId, InputError> {
        if operations.is_empty() {
            return Err(InputError::EmptyBatch);
        }
        let call = api.update_notepage(client, canvas_id, &operations)?;

        let id = self.next_batch;
        self.next_batch += 1;
        log::debug!(
            "Batch {} ({}) submitted for {} with {} operation(s)",
            id,
            call.id(),
            canvas_id,
            operations.len()
        );
        self.in_flight.push(InFlightBatch { id, canvas_id: canvas_id.to_string(), call });
        Ok(id)
    }

    /// Apply every resolved batch to `canvas` and report what happened.
    pub fn poll(&mut self, canvas: &mut Canvas) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        let mut still_pending = Vec::with_capacity(self.in_flight.len());

        for mut batch in self.in_flight.drain(..) {
            match batch.call.try_take() {
                None => still_pending.push(batch),
                Some(Ok(result)) if batch.canvas_id == canvas.id() => {
                    let report = apply_update(canvas, &result);
                    log::debug!(
                        "Batch {} applied: {} now at {}",
                        batch.id,
                        canvas.id(),
                        result.notepage_revision_id
                    );
                    events.push(SyncEvent::BatchApplied {
                        batch: batch.id,
                        revision_id: result.notepage_revision_id,
                        updated: report.updated,
                        skipped: report.skipped,
                    });
                }
                Some(Ok(_)) => {
                    log::error!(
                        "Batch {} for {} resolved against canvas {}; result dropped",
                        batch.id,
                        batch.canvas_id,
                        canvas.id()
                    );
                }
                Some(Err(error)) => {
                    log::warn!("Batch {} for {} failed: {}", batch.id, batch.canvas_id, error);
                    events.push(SyncEvent::BatchFailed { batch: batch.id, error });
                }
            }
        }

        self.in_flight = still_pending;
        events
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;
    use crate::rpc::INTERNAL_ERROR;
    use crate::transport::LoopbackTransport;
    use serde_json::json;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new("/page1", RevisionId(1));
        canvas.notes_mut().upsert(Note {
            id: NoteId(7),
            name: "a".into(),
            pos_um: MicronVec::new(0, 0),
            size_um: MicronVec::new(1000, 1000),
            z_index: 0,
            contents_markdown: String::new(),
            revision_id: RevisionId(1),
        });
        canvas
    }

    fn move_op(x: i64, y: i64) -> NoteOperation {
        NoteOperation::EditNote(EditNote {
            note_id: NoteId(7),
            revision_id: RevisionId(1),
            patch: NotePatch::position(MicronVec::new(x, y)),
        })
    }

    #[test]
    fn test_operation_wire_shape() {
        assert_eq!(
            serde_json::to_value(move_op(25, 25)).unwrap(),
            json!({"action": "edit_note", "note_id": 7, "revision_id": 1, "pos_um": [25, 25]})
        );
        let decoded: NoteOperation = serde_json::from_value(json!({
            "action": "edit_note", "note_id": 7, "revision_id": 1, "contents_markdown": "x"
        }))
        .unwrap();
        assert_eq!(decoded.note_id(), NoteId(7));
    }

    #[test]
    fn test_apply_update_adopts_server_values() {
        let mut canvas = canvas();
        let result: UpdateNotepageResult = serde_json::from_value(json!({
            "notepage_revision_id": 5,
            "results": [
                {"note_id": 7, "pos_um": [30, 20], "revision_id": 3},
                {"note_id": 99, "pos_um": [1, 1]},
            ],
        }))
        .unwrap();
        let report = apply_update(&mut canvas, &result);
        assert_eq!(report.updated, vec![NoteId(7)]);
        assert_eq!(report.skipped, vec![NoteId(99)]);
        assert_eq!(canvas.revision_id(), RevisionId(5));
        let note = canvas.notes().get(NoteId(7)).unwrap();
        assert_eq!(note.pos_um, MicronVec::new(30, 20));
        assert_eq!(note.revision_id, RevisionId(3));
        assert!(canvas.notes().get(NoteId(99)).is_none());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let mut client = RpcClient::new(LoopbackTransport::new(), None);
        let mut engine = SyncEngine::new();
        let err = engine.submit(&mut client, &Api::default(), "/page1", Vec::new()).unwrap_err();
        assert_eq!(err, InputError::EmptyBatch);
        assert!(client.transport().sent().is_empty());
    }

    #[test]
    fn test_one_call_per_batch() {
        let mut client = RpcClient::new(LoopbackTransport::new(), None);
        let mut engine = SyncEngine::new();
        let api = Api::default();
        engine.submit(&mut client, &api, "/page1", vec![move_op(1, 1)]).unwrap();
        engine.submit(&mut client, &api, "/page1", vec![move_op(2, 2), move_op(3, 3)]).unwrap();

        let sent = client.transport().requests_for("dozer.update_notepage");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].params["notepage_name"], json!("/page1"));
        assert_eq!(sent[1].params["operations"].as_array().unwrap().len(), 2);
        assert_eq!(engine.in_flight(), 2);
    }

    #[test]
    fn test_poll_reports_failures() {
        let mut client = RpcClient::new(LoopbackTransport::new(), None);
        let mut engine = SyncEngine::new();
        let mut canvas = canvas();
        let batch = engine.submit(&mut client, &Api::default(), "/page1", vec![move_op(1, 1)]).unwrap();

        let id = client.transport().sent()[0].id.clone();
        client.transport_mut().respond_error(&id, &RpcError::new(4, "Permission denied"));
        client.pump();

        let events = engine.poll(&mut canvas);
        assert_eq!(
            events,
            vec![SyncEvent::BatchFailed { batch, error: RpcError::new(4, "Permission denied") }]
        );
        assert_eq!(canvas.revision_id(), RevisionId(1));
        assert_eq!(engine.in_flight(), 0);
    }

    #[test]
    fn test_undecodable_result_fails_batch() {
        let mut client = RpcClient::new(LoopbackTransport::new(), None);
        let mut engine = SyncEngine::new();
        let mut canvas = canvas();
        engine.submit(&mut client, &Api::default(), "/page1", vec![move_op(1, 1)]).unwrap();

        let id = client.transport().sent()[0].id.clone();
        client.transport_mut().respond_result(&id, json!({"results": "nope"}));
        client.pump();

        let events = engine.poll(&mut canvas);
        let [SyncEvent::BatchFailed { error, .. }] = events.as_slice() else {
            panic!("expected one failed batch, got {events:?}");
        };
        assert_eq!(error.code, INTERNAL_ERROR);
    }
}
