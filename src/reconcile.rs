//! Pure settings transitions and the side-effect intents they require.
//!
//! Every operation maps one configuration snapshot to the next and returns
//! the ordered intent list the change requires. The model performs no I/O:
//! the embedding orchestrator executes the intents, persist first, and only
//! then the push-channel and scheduler steps that re-derive from persisted
//! state. Validation failures produce no intents at all.

use crate::constants::SYNC_INTERVAL_CHOICES;
use crate::error::SettingsError;
use crate::settings::{AccountSyncConfig, IntervalField, SyncMode};

/// Push channel lifecycle action required by a sync mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushChannelAction {
    Start,
    Stop,
}

/// A single persisted field update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChange {
    SyncMode(SyncMode),
    SyncIntervalMinutes(u32),
    NightModeEnabled(bool),
    IgnoreBatterySaver(bool),
    IntervalDays(IntervalField, u32),
}

/// A side effect the orchestrator must carry out, in list order.
///
/// `Persist` advances the authoritative stored state and must be observed as
/// complete before the intents after it are issued. `PushChannel` and
/// `Reschedule` re-derive from persisted state and are safe to repeat when a
/// caller retries after partial failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Persist(FieldChange),
    PushChannel(PushChannelAction),
    Reschedule,
}

impl AccountSyncConfig {
    /// Change the sync mode.
    ///
    /// Exactly one push-channel intent fires per mode change: `Start` when
    /// entering push mode, `Stop` when leaving it. Out-of-set modes are
    /// unrepresentable here; the string boundary ([`SyncMode::parse`])
    /// rejects unknown tags before an update is ever built.
    pub fn with_sync_mode(&self, mode: SyncMode) -> (Self, Vec<Intent>) {
        let mut next = self.clone();
        next.sync_mode = mode;

        let channel = if mode == SyncMode::Push {
            PushChannelAction::Start
        } else {
            PushChannelAction::Stop
        };

        let intents = vec![
            Intent::Persist(FieldChange::SyncMode(mode)),
            Intent::PushChannel(channel),
            Intent::Reschedule,
        ];
        (next, intents)
    }

    /// Change the polling interval. `minutes` must be one of
    /// [`SYNC_INTERVAL_CHOICES`].
    pub fn with_sync_interval(
        &self,
        minutes: u32,
    ) -> Result<(Self, Vec<Intent>), SettingsError> {
        if !SYNC_INTERVAL_CHOICES.contains(&minutes) {
            return Err(SettingsError::InvalidEnumValue {
                setting: "sync interval",
                value: minutes.to_string(),
            });
        }

        let mut next = self.clone();
        next.sync_interval_minutes = minutes;

        let intents = vec![
            Intent::Persist(FieldChange::SyncIntervalMinutes(minutes)),
            Intent::Reschedule,
        ];
        Ok((next, intents))
    }

    /// Toggle night mode. A re-plan is always requested; the scheduler
    /// no-ops when nothing effectively changes.
    pub fn with_night_mode(&self, enabled: bool) -> (Self, Vec<Intent>) {
        let mut next = self.clone();
        next.night_mode_enabled = enabled;

        let intents = vec![
            Intent::Persist(FieldChange::NightModeEnabled(enabled)),
            Intent::Reschedule,
        ];
        (next, intents)
    }

    /// Toggle the battery-saver override. Same shape as night mode.
    pub fn with_ignore_battery_saver(&self, ignore: bool) -> (Self, Vec<Intent>) {
        let mut next = self.clone();
        next.ignore_battery_saver = ignore;

        let intents = vec![
            Intent::Persist(FieldChange::IgnoreBatterySaver(ignore)),
            Intent::Reschedule,
        ];
        (next, intents)
    }

    /// Change a PIM sync cadence or cleanup retention, in days.
    ///
    /// Day intervals are orthogonal to the sync scheduler: no re-plan intent
    /// is emitted.
    pub fn with_interval_days(
        &self,
        field: IntervalField,
        days: i64,
    ) -> Result<(Self, Vec<Intent>), SettingsError> {
        let days = u32::try_from(days).map_err(|_| SettingsError::InvalidRange {
            setting: field.setting_name(),
            value: days,
        })?;

        let mut next = self.clone();
        match field {
            IntervalField::Contacts => next.contacts_sync_days = days,
            IntervalField::Notes => next.notes_sync_days = days,
            IntervalField::Calendar => next.calendar_sync_days = days,
            IntervalField::Tasks => next.tasks_sync_days = days,
            IntervalField::CleanupTrash => next.cleanup_trash_days = days,
            IntervalField::CleanupDrafts => next.cleanup_drafts_days = days,
            IntervalField::CleanupSpam => next.cleanup_spam_days = days,
        }

        let intents = vec![Intent::Persist(FieldChange::IntervalDays(field, days))];
        Ok((next, intents))
    }
}
