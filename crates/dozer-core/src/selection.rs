//! Note selection.

use crate::input::{KeyBindings, Modifiers};
use crate::note::NoteId;
use std::collections::BTreeSet;

/// How a click changes the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOp {
    /// Replace the selection with the clicked note, or clear it on background.
    Replace,
    /// Union with the clicked note.
    Add,
    /// Difference with the clicked note.
    Subtract,
}

impl SelectOp {
    /// Pick the operation from the modifiers held during the click.
    /// The subtract modifier wins when both are held.
    pub fn from_modifiers(modifiers: Modifiers, bindings: &KeyBindings) -> Self {
        if modifiers.has(bindings.subtract) {
            Self::Subtract
        } else if modifiers.has(bindings.add) {
            Self::Add
        } else {
            Self::Replace
        }
    }
}

/// The set of selected notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<NoteId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a click on `target` (`None` for the background).
    /// Returns the ids whose selected state changed.
    pub fn apply(&mut self, op: SelectOp, target: Option<NoteId>) -> Vec<NoteId> {
        match (op, target) {
            (SelectOp::Replace, target) => {
                let next: BTreeSet<NoteId> = target.into_iter().collect();
                let changed = self.selected.symmetric_difference(&next).copied().collect();
                self.selected = next;
                changed
            }
            (SelectOp::Add, Some(id)) => {
                if self.selected.insert(id) { vec![id] } else { Vec::new() }
            }
            (SelectOp::Subtract, Some(id)) => {
                if self.selected.remove(&id) { vec![id] } else { Vec::new() }
            }
            // Modified clicks on the background leave the selection alone.
            (_, None) => Vec::new(),
        }
    }

    /// Clear the selection. Returns the ids that were selected.
    pub fn clear(&mut self) -> Vec<NoteId> {
        std::mem::take(&mut self.selected).into_iter().collect()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.selected.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(selection: &Selection) -> Vec<i64> {
        selection.iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_replace_and_clear() {
        let mut selection = Selection::new();
        assert_eq!(selection.apply(SelectOp::Replace, Some(NoteId(1))), vec![NoteId(1)]);
        let changed = selection.apply(SelectOp::Replace, Some(NoteId(2)));
        assert_eq!(changed, vec![NoteId(1), NoteId(2)]);
        assert_eq!(ids(&selection), vec![2]);

        assert_eq!(selection.apply(SelectOp::Replace, None), vec![NoteId(2)]);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_add_and_subtract() {
        let mut selection = Selection::new();
        selection.apply(SelectOp::Replace, Some(NoteId(1)));
        selection.apply(SelectOp::Add, Some(NoteId(3)));
        assert!(selection.apply(SelectOp::Add, Some(NoteId(3))).is_empty());
        assert_eq!(ids(&selection), vec![1, 3]);

        assert_eq!(selection.apply(SelectOp::Subtract, Some(NoteId(1))), vec![NoteId(1)]);
        assert!(selection.apply(SelectOp::Subtract, Some(NoteId(9))).is_empty());
        assert_eq!(ids(&selection), vec![3]);

        assert!(selection.apply(SelectOp::Add, None).is_empty());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_op_from_modifiers() {
        let bindings = KeyBindings::default();
        assert_eq!(SelectOp::from_modifiers(Modifiers::NONE, &bindings), SelectOp::Replace);
        assert_eq!(SelectOp::from_modifiers(Modifiers::shift(), &bindings), SelectOp::Add);
        assert_eq!(SelectOp::from_modifiers(Modifiers::alt(), &bindings), SelectOp::Subtract);
        let both = Modifiers { shift: true, alt: true, ..Modifiers::NONE };
        assert_eq!(SelectOp::from_modifiers(both, &bindings), SelectOp::Subtract);
    }

    #[test]
    fn test_clear_returns_previous() {
        let mut selection = Selection::new();
        selection.apply(SelectOp::Add, Some(NoteId(4)));
        selection.apply(SelectOp::Add, Some(NoteId(2)));
        assert_eq!(selection.clear(), vec![NoteId(2), NoteId(4)]);
        assert!(selection.clear().is_empty());
    }
}
