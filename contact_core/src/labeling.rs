//! Labeling workflow: a cursor over the tracked contacts plus the label
//! transition rules.
//!
//! All operations are total over a possibly-empty contact list: boundary
//! navigation clamps instead of wrapping, and nothing here ever panics or
//! errors under normal use. Only labels and the cursor ever change; frames,
//! bounding boxes and raw data are never touched from this module.
//!
//! The invalid auto-skip is deliberately asymmetric: an invalid contact is
//! only skipped while at least one contact still carries the `Seen` state.
//! When nothing is left to resolve the cursor is allowed to land on an
//! invalid contact, so the operator is not bounced across the whole list.

use crate::contact::Contact;
use crate::types::{ContactId, Label};

/// Owns the ordered contact list for the active measurement and the
/// currently selected index. One instance per session; consumers read the
/// `(contacts, current_index)` pair after every operation.
#[derive(Default)]
pub struct LabelingStateMachine {
    contacts: Vec<Contact>,
    current: usize,
}

impl LabelingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the working set with a fresh tracking result and reset the
    /// cursor. The swap is atomic from the caller's point of view: no
    /// partially-updated list is ever observable.
    pub fn load(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;
        self.current = 0;
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Current cursor position, or `None` while the list is empty.
    pub fn current_index(&self) -> Option<usize> {
        if self.contacts.is_empty() {
            None
        } else {
            Some(self.current)
        }
    }

    pub fn current_contact(&self) -> Option<&Contact> {
        self.contacts.get(self.current)
    }

    /// True when any contact currently carries `label`.
    pub fn any_contact_has_label(&self, label: Label) -> bool {
        self.contacts.iter().any(|c| c.label() == label)
    }

    /// Assign a limb identity to the current contact and move on. Invalid
    /// contacts reject the assignment (they must be un-invalidated through
    /// [`remove_label`](Self::remove_label) first) but the cursor still
    /// advances.
    pub fn select_label(&mut self, limb: u8) {
        if self.contacts.is_empty() {
            return;
        }
        let current = &mut self.contacts[self.current];
        if current.label() != Label::Invalid {
            current.set_label(Label::Limb(limb));
        }
        self.advance_next();
    }

    /// Move the cursor one contact forward, clamped at the end of the list.
    /// Leaving a contact that is still `Unlabeled` demotes it to `Seen`.
    /// Invalid contacts are skipped while any `Seen` contact remains.
    pub fn advance_next(&mut self) {
        if self.contacts.is_empty() {
            return;
        }
        loop {
            if self.current == self.contacts.len() - 1 {
                return;
            }
            self.mark_left();
            self.current += 1;
            if self.contacts[self.current].label() == Label::Invalid
                && self.any_contact_has_label(Label::Seen)
            {
                continue;
            }
            return;
        }
    }

    /// Mirror of [`advance_next`](Self::advance_next), clamped at index 0.
    pub fn advance_previous(&mut self) {
        if self.contacts.is_empty() {
            return;
        }
        loop {
            if self.current == 0 {
                return;
            }
            self.mark_left();
            self.current -= 1;
            if self.contacts[self.current].label() == Label::Invalid
                && self.any_contact_has_label(Label::Seen)
            {
                continue;
            }
            return;
        }
    }

    /// Demote the contact being left from `Unlabeled` to `Seen`.
    fn mark_left(&mut self) {
        let current = &mut self.contacts[self.current];
        if current.label() == Label::Unlabeled {
            current.set_label(Label::Seen);
        }
    }

    /// Mark the current contact invalid. No leave-marking, no auto-advance.
    pub fn mark_invalid(&mut self) {
        if let Some(current) = self.contacts.get_mut(self.current) {
            current.set_label(Label::Invalid);
        }
    }

    /// Clear the current contact back to the active `Unlabeled` state.
    /// Any other contact still holding `Unlabeled` is demoted to `Seen`
    /// first, so at most one contact is ever the active one.
    pub fn remove_label(&mut self) {
        if self.contacts.is_empty() {
            return;
        }
        for contact in &mut self.contacts {
            if contact.label() == Label::Unlabeled {
                contact.set_label(Label::Seen);
            }
        }
        self.contacts[self.current].set_label(Label::Unlabeled);
    }

    /// Step back one contact and make it the active unlabeled one.
    pub fn undo_label(&mut self) {
        self.advance_previous();
        self.remove_label();
    }

    /// Jump the cursor straight to a specific contact (operator clicked it
    /// in a list). Labels are untouched; unknown ids are ignored.
    pub fn relabel_select(&mut self, id: ContactId) {
        if let Some(position) = self.contacts.iter().position(|c| c.id() == id) {
            self.current = position;
        }
    }

    /// Drop a contact from the working set by position, clamping the
    /// cursor if it pointed at or past the removed entry.
    pub fn delete_contact(&mut self, index: usize) {
        if index >= self.contacts.len() {
            return;
        }
        self.contacts.remove(index);
        if !self.contacts.is_empty() {
            self.current = self.current.min(self.contacts.len() - 1);
        } else {
            self.current = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
