//! Interaction state machine for dragging, editing and selecting notes.
//!
//! The machine holds note ids only. Note records stay in the store; the
//! machine reads them through an [`InteractionContext`] and asks the caller
//! to persist changes by returning [`InteractionOutcome::Commit`].

use crate::input::{HitTarget, KeyBindings, KeyEvent, MouseButton, PointerEvent};
use crate::note::{Note, NoteId, NotePatch};
use crate::selection::{SelectOp, Selection};
use crate::store::NoteStore;
use crate::surface::{MarkupRenderer, NotePlacement, Surface};
use crate::sync::EditNote;
use crate::transform::{truncate_px, Calibration};
use kurbo::{Point, Vec2};

/// An ongoing drag of one note.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub note_id: NoteId,
    /// Last observed pointer position. Deltas are taken from here, not from
    /// the drag origin.
    pub last_pointer: Point,
    /// On-screen offset of the note when the drag started.
    pub start_offset: Point,
}

/// An open editor on one note.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub note_id: NoteId,
    /// The note as it was when editing began. Supplies the revision for the
    /// commit.
    pub snapshot: Note,
}

/// The one active interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging(DragSession),
    Editing(EditSession),
    /// The last gesture was a selection click. The selected set itself lives
    /// in [`InteractionMachine::selection`] and survives other modes.
    Selecting,
}

/// What handling an event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    /// Not consumed; let it reach other handlers.
    Ignored,
    /// Consumed with no model change.
    Handled,
    /// Consumed; persist this edit.
    Commit(EditNote),
}

impl InteractionOutcome {
    pub fn is_consumed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Everything the machine reads or draws while handling one event.
pub struct InteractionContext<'a> {
    pub notes: &'a NoteStore,
    pub surface: &'a mut dyn Surface,
    pub renderer: &'a dyn MarkupRenderer,
    pub calibration: &'a Calibration,
}

impl InteractionContext<'_> {
    fn redraw(&mut self, note: &Note) {
        let html = self.renderer.render(&note.contents_markdown);
        self.surface.draw_note(note, &NotePlacement::for_note(note, self.calibration), &html);
    }

    /// Redraw an abandoned edit from the store, which may have taken server
    /// changes while the editor was open. The snapshot only stands in when
    /// the note is gone.
    fn restore(&mut self, edit: &EditSession) {
        let note = self.notes.get(edit.note_id).cloned().unwrap_or_else(|| edit.snapshot.clone());
        self.redraw(&note);
    }
}

#[derive(Debug, Clone, Default)]
pub struct InteractionMachine {
    mode: InteractionMode,
    selection: Selection,
    bindings: KeyBindings,
}

impl InteractionMachine {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { mode: InteractionMode::Idle, selection: Selection::new(), bindings }
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// The note being dragged or edited, if any.
    pub fn active_note(&self) -> Option<NoteId> {
        match &self.mode {
            InteractionMode::Dragging(drag) => Some(drag.note_id),
            InteractionMode::Editing(edit) => Some(edit.note_id),
            InteractionMode::Idle | InteractionMode::Selecting => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, InteractionMode::Dragging(_))
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, InteractionMode::Editing(_))
    }

    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        match event {
            PointerEvent::Down { position, button, target } => {
                self.pointer_down(*position, *button, *target, ctx)
            }
            PointerEvent::Move { position, primary_held } => {
                self.pointer_move(*position, *primary_held, ctx)
            }
            PointerEvent::Up { button: MouseButton::Left, .. } if self.is_dragging() => {
                self.finish_drag(ctx)
            }
            PointerEvent::Up { .. } => InteractionOutcome::Ignored,
            PointerEvent::Click { button, target, modifiers, .. } => {
                if *button != MouseButton::Left {
                    return InteractionOutcome::Ignored;
                }
                let op = SelectOp::from_modifiers(*modifiers, &self.bindings);
                self.click(op, *target, ctx)
            }
            PointerEvent::DoubleClick { target, .. } => self.double_click(*target, ctx),
        }
    }

    /// The window lost focus. Ends a drag; an open editor stays open.
    pub fn focus_lost(&mut self, ctx: &mut InteractionContext<'_>) -> InteractionOutcome {
        if self.is_dragging() {
            self.finish_drag(ctx)
        } else {
            InteractionOutcome::Ignored
        }
    }

    /// Handle a key press. Only the commit and cancel chords are consumed,
    /// and only while editing.
    pub fn handle_key(
        &mut self,
        event: &KeyEvent,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        let InteractionMode::Editing(edit) = &self.mode else {
            return InteractionOutcome::Ignored;
        };

        if self.bindings.is_commit(event) {
            let edit = edit.clone();
            self.mode = InteractionMode::Idle;
            match ctx.surface.close_editor(edit.note_id) {
                Some(text) => {
                    log::debug!("Committing edit of note {}", edit.note_id);
                    InteractionOutcome::Commit(EditNote {
                        note_id: edit.note_id,
                        revision_id: edit.snapshot.revision_id,
                        patch: NotePatch::contents(text),
                    })
                }
                None => {
                    log::warn!("Editor for note {} vanished; treating commit as cancel", edit.note_id);
                    ctx.restore(&edit);
                    InteractionOutcome::Handled
                }
            }
        } else if self.bindings.is_cancel(event) {
            let edit = edit.clone();
            self.mode = InteractionMode::Idle;
            ctx.surface.close_editor(edit.note_id);
            ctx.restore(&edit);
            InteractionOutcome::Handled
        } else {
            InteractionOutcome::Ignored
        }
    }

    fn pointer_down(
        &mut self,
        position: Point,
        button: MouseButton,
        target: HitTarget,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if button != MouseButton::Left || self.is_editing() || self.is_dragging() {
            return InteractionOutcome::Ignored;
        }
        let HitTarget::Note(note_id) = target else {
            return InteractionOutcome::Ignored;
        };
        let Some(note) = ctx.notes.get(note_id) else {
            return InteractionOutcome::Ignored;
        };

        let start_offset = ctx
            .surface
            .note_offset_px(note_id)
            .unwrap_or_else(|| truncate_px(ctx.calibration.um_to_px(note.pos_um)));
        self.mode = InteractionMode::Dragging(DragSession {
            note_id,
            last_pointer: position,
            start_offset,
        });
        InteractionOutcome::Handled
    }

    fn pointer_move(
        &mut self,
        position: Point,
        primary_held: bool,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        let InteractionMode::Dragging(drag) = &mut self.mode else {
            return InteractionOutcome::Ignored;
        };
        if !primary_held {
            // Released outside the window.
            return self.finish_drag(ctx);
        }

        let Some(current) = ctx.surface.note_offset_px(drag.note_id) else {
            log::warn!("Dragged note {} is no longer on screen", drag.note_id);
            self.mode = InteractionMode::Idle;
            return InteractionOutcome::Handled;
        };
        let delta: Vec2 = position - drag.last_pointer;
        ctx.surface.set_note_offset_px(drag.note_id, truncate_px(current) + delta);
        drag.last_pointer = position;
        InteractionOutcome::Handled
    }

    fn finish_drag(&mut self, ctx: &mut InteractionContext<'_>) -> InteractionOutcome {
        let InteractionMode::Dragging(drag) = std::mem::take(&mut self.mode) else {
            return InteractionOutcome::Ignored;
        };
        let Some(note) = ctx.notes.get(drag.note_id) else {
            log::warn!("Dragged note {} disappeared from the store", drag.note_id);
            return InteractionOutcome::Handled;
        };

        let final_offset = ctx
            .surface
            .note_offset_px(drag.note_id)
            .map(truncate_px)
            .unwrap_or(drag.start_offset);
        let displacement = final_offset - drag.start_offset;
        let pos_um = note.pos_um + ctx.calibration.px_delta_to_um(displacement);

        if pos_um == note.pos_um {
            log::debug!("Note {} dropped where it started", note.id);
            return InteractionOutcome::Handled;
        }

        log::debug!("Note {} moved to ({}, {}) um", note.id, pos_um.x, pos_um.y);
        InteractionOutcome::Commit(EditNote {
            note_id: note.id,
            revision_id: note.revision_id,
            patch: NotePatch::position(pos_um),
        })
    }

    fn double_click(
        &mut self,
        target: HitTarget,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if self.is_editing() || self.is_dragging() {
            return InteractionOutcome::Ignored;
        }
        let HitTarget::Note(note_id) = target else {
            return InteractionOutcome::Ignored;
        };
        let Some(note) = ctx.notes.get(note_id) else {
            return InteractionOutcome::Ignored;
        };

        let snapshot = note.clone();
        ctx.surface.open_editor(note_id, &snapshot.contents_markdown);
        self.mode = InteractionMode::Editing(EditSession { note_id, snapshot });
        InteractionOutcome::Handled
    }

    fn click(
        &mut self,
        op: SelectOp,
        target: HitTarget,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if self.is_editing() || self.is_dragging() {
            return InteractionOutcome::Ignored;
        }
        let target = match target {
            HitTarget::Canvas => None,
            HitTarget::Note(id) if ctx.notes.contains(id) => Some(id),
            HitTarget::Note(_) | HitTarget::NoteControl(_) => return InteractionOutcome::Ignored,
        };

        for id in self.selection.apply(op, target) {
            ctx.surface.set_selected(id, self.selection.contains(id));
        }
        self.mode = InteractionMode::Selecting;
        InteractionOutcome::Handled
    }
}
