//! Modal edit-session state for settings screens.
//!
//! A settings screen edits one value at a time through a modal dialog.
//! [`ActiveEditor`] replaces a pile of per-dialog visibility flags with a
//! single value: opening an editor implicitly closes whichever one was open.
//! This state belongs to the presentation layer driving the screen, never to
//! the core model.

use crate::settings::{AccountSyncConfig, AccountType, IntervalField};

/// The modal editor currently open on a settings screen, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveEditor {
    #[default]
    None,
    SyncMode,
    SyncInterval,
    IntervalDays(IntervalField),
}

impl ActiveEditor {
    /// Open `editor`, closing any other open editor.
    pub fn open(&mut self, editor: ActiveEditor) {
        *self = editor;
    }

    pub fn close(&mut self) {
        *self = ActiveEditor::None;
    }

    pub fn is_open(&self) -> bool {
        *self != ActiveEditor::None
    }
}

/// Editors meaningful for `config`, in screen order.
///
/// The sync-mode editor is offered for Exchange accounts only; the polling
/// interval editor only while the interval is applicable; PIM cadence editors
/// for Exchange accounts; cleanup retention editors always.
pub fn available_editors(config: &AccountSyncConfig) -> Vec<ActiveEditor> {
    let mut editors = Vec::new();

    if config.account_type == AccountType::Exchange {
        editors.push(ActiveEditor::SyncMode);
    }
    if config.interval_applicable() {
        editors.push(ActiveEditor::SyncInterval);
    }
    for field in IntervalField::ALL {
        if !field.exchange_only() || config.account_type == AccountType::Exchange {
            editors.push(ActiveEditor::IntervalDays(field));
        }
    }

    editors
}
