//! One open notepage and everything that acts on it.

use crate::api::Api;
use crate::canvas::Canvas;
use crate::config::ClientConfig;
use crate::error::{InputError, SessionError};
use crate::input::{KeyEvent, PointerEvent};
use crate::interaction::{InteractionContext, InteractionMachine, InteractionOutcome};
use crate::note::{Note, NoteId};
use crate::rpc::{RpcClient, TypedCall};
use crate::surface::{MarkdownRenderer, MarkupRenderer, NotePlacement, Surface};
use crate::sync::{EditNote, NoteOperation, SyncEngine, SyncEvent};
use crate::transform::{Calibration, CalibrationProbe, MicronVec};
use crate::transport::Transport;

/// An open notepage.
///
/// Owns the canvas, the interaction machine, the sync engine, the RPC
/// client, the cached calibration, the surface and the renderer. All
/// methods run on the single control-flow thread.
pub struct NotepageSession<T: Transport, S: Surface> {
    config: ClientConfig,
    api: Api,
    canvas: Canvas,
    client: RpcClient<T>,
    sync: SyncEngine,
    interaction: InteractionMachine,
    calibration: Calibration,
    surface: S,
    renderer: Box<dyn MarkupRenderer>,
    pending_creates: Vec<TypedCall<Note>>,
}

impl<T: Transport, S: Surface> NotepageSession<T, S> {
    /// Calibrate against the live surface, then draw every note.
    pub fn open<P: CalibrationProbe + ?Sized>(
        config: ClientConfig,
        canvas: Canvas,
        transport: T,
        surface: S,
        probe: &mut P,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let calibration = Calibration::measure(probe, config.reference_length_um)?;

        let mut session = Self {
            api: Api::new(config.namespace.clone()),
            client: RpcClient::new(transport, config.request_timeout()),
            interaction: InteractionMachine::new(config.key_bindings.clone()),
            sync: SyncEngine::new(),
            config,
            canvas,
            calibration,
            surface,
            renderer: Box::new(MarkdownRenderer::new()),
            pending_creates: Vec::new(),
        };
        session.redraw_all();

        log::info!(
            "Opened notepage {} at {} with {} notes",
            session.canvas.id(),
            session.canvas.revision_id(),
            session.canvas.notes().len()
        );
        Ok(session)
    }

    /// Replace the markup renderer and redraw.
    pub fn with_renderer(mut self, renderer: impl MarkupRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self.redraw_all();
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn interaction(&self) -> &InteractionMachine {
        &self.interaction
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn client(&self) -> &RpcClient<T> {
        &self.client
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.client.transport_mut()
    }

    /// Handle a pointer event. Returns whether it was consumed.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        let mut ctx = InteractionContext {
            notes: self.canvas.notes(),
            surface: &mut self.surface,
            renderer: self.renderer.as_ref(),
            calibration: &self.calibration,
        };
        let outcome = self.interaction.handle_pointer(event, &mut ctx);
        self.finish(outcome)
    }

    /// Handle a key press. Returns whether it was consumed.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let mut ctx = InteractionContext {
            notes: self.canvas.notes(),
            surface: &mut self.surface,
            renderer: self.renderer.as_ref(),
            calibration: &self.calibration,
        };
        let outcome = self.interaction.handle_key(event, &mut ctx);
        self.finish(outcome)
    }

    /// The window lost focus.
    pub fn focus_lost(&mut self) {
        let mut ctx = InteractionContext {
            notes: self.canvas.notes(),
            surface: &mut self.surface,
            renderer: self.renderer.as_ref(),
            calibration: &self.calibration,
        };
        let outcome = self.interaction.focus_lost(&mut ctx);
        self.finish(outcome);
    }

    /// Ask the server for a new note on this notepage. The note is drawn
    /// once the server returns it.
    pub fn create_note(
        &mut self,
        pos_um: Option<MicronVec>,
        size_um: Option<MicronVec>,
    ) -> Result<(), InputError> {
        let call = self.api.create_note(&mut self.client, self.canvas.id(), pos_um, size_um)?;
        self.pending_creates.push(call);
        Ok(())
    }

    /// Apply everything that arrived since the last pump and redraw the
    /// affected notes.
    pub fn pump(&mut self) -> Vec<SyncEvent> {
        self.client.pump();

        let mut events = self.sync.poll(&mut self.canvas);
        for event in &events {
            if let SyncEvent::BatchApplied { updated, .. } = event {
                for id in updated {
                    self.draw(*id);
                }
            }
        }

        let mut created = Vec::new();
        let mut still_pending = Vec::new();
        for mut call in std::mem::take(&mut self.pending_creates) {
            match call.try_take() {
                None => still_pending.push(call),
                Some(Ok(note)) => created.push(note),
                Some(Err(error)) => {
                    log::warn!("{} failed: {}", call.method(), error);
                    events.push(SyncEvent::CallFailed { method: call.method().to_string(), error });
                }
            }
        }
        self.pending_creates = still_pending;

        for note in created {
            let note_id = note.id;
            log::info!("Note {} created on {}", note_id, self.canvas.id());
            self.canvas.notes_mut().upsert(note);
            self.draw(note_id);
            events.push(SyncEvent::NoteCreated { note_id });
        }
        events
    }

    /// Redraw every note, back to front.
    pub fn redraw_all(&mut self) {
        let ids: Vec<NoteId> = self.canvas.notes().paint_order().iter().map(|n| n.id).collect();
        for id in ids {
            self.draw(id);
        }
    }

    fn draw(&mut self, id: NoteId) {
        // The note under an open editor or a drag owns its on-screen state.
        if self.interaction.active_note() == Some(id) {
            log::debug!("Deferring redraw of note {} until the interaction ends", id);
            return;
        }
        let Some(note) = self.canvas.notes().get(id) else {
            return;
        };
        let html = self.renderer.render(&note.contents_markdown);
        let placement = NotePlacement::for_note(note, &self.calibration);
        self.surface.draw_note(note, &placement, &html);
        self.surface.set_selected(id, self.interaction.selection().contains(id));
    }

    fn finish(&mut self, outcome: InteractionOutcome) -> bool {
        let consumed = outcome.is_consumed();
        if let InteractionOutcome::Commit(edit) = outcome {
            self.commit(edit);
        }
        consumed
    }

    /// Apply an edit locally, then submit it as its own batch.
    fn commit(&mut self, edit: EditNote) {
        let note_id = edit.note_id;
        if let Some(note) = self.canvas.notes().get(note_id) {
            let updated = note.with_patch(&edit.patch);
            self.canvas.notes_mut().upsert(updated);
            self.draw(note_id);
        }

        let operations = vec![NoteOperation::EditNote(edit)];
        if let Err(e) = self.sync.submit(&mut self.client, &self.api, self.canvas.id(), operations) {
            log::error!("Could not submit edit of note {}: {}", note_id, e);
        }
    }
}
