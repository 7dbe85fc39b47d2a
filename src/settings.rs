//! Validated per-account sync and cleanup configuration.
//!
//! Stored enum fields are free-form strings that may predate the current
//! schema or be hand-edited, so every load goes through [`normalize`], which
//! never fails: unknown tags resolve to documented defaults and the settings
//! stay renderable. Strict parsing ([`AccountType::parse`],
//! [`SyncMode::parse`]) is reserved for *proposed* values coming from the UI,
//! where an unknown tag is a caller error.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PIM_SYNC_DAYS, DEFAULT_SYNC_INTERVAL_MINUTES};
use crate::error::SettingsError;

/// Mailbox protocol family of an account.
///
/// Determines which sync settings are meaningful: only Exchange accounts have
/// a sync mode and PIM sync cadences; every other type polls on an interval.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Exchange,
    Imap,
    Pop3,
}

impl AccountType {
    /// Total parse of a stored tag. Unknown or empty tags fall back to
    /// [`AccountType::Exchange`].
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|_| {
            tracing::debug!("unknown account type tag '{}', treating as exchange", raw);
            Self::Exchange
        })
    }

    /// Strict parse of a proposed tag.
    pub fn parse(raw: &str) -> Result<Self, SettingsError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exchange" => Ok(Self::Exchange),
            "imap" => Ok(Self::Imap),
            "pop3" => Ok(Self::Pop3),
            _ => Err(SettingsError::InvalidEnumValue {
                setting: "account type",
                value: raw.to_string(),
            }),
        }
    }

    /// Stable tag used in the store and on the wire.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Exchange => "exchange",
            Self::Imap => "imap",
            Self::Pop3 => "pop3",
        }
    }

    /// Display label for settings screens. Localization lives with the caller.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exchange => "Exchange",
            Self::Imap => "IMAP",
            Self::Pop3 => "POP3",
        }
    }
}

/// How new mail reaches the client. Meaningful for Exchange accounts only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// The server notifies the client over a persistent channel.
    #[default]
    Push,
    /// The client polls at a fixed interval.
    Scheduled,
    /// Sync only when the user asks for it.
    Manual,
}

impl SyncMode {
    /// Total parse of a stored tag. Unknown or empty tags fall back to
    /// [`SyncMode::Push`].
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|_| {
            tracing::debug!("unknown sync mode tag '{}', treating as push", raw);
            Self::Push
        })
    }

    /// Strict parse of a proposed tag.
    pub fn parse(raw: &str) -> Result<Self, SettingsError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "scheduled" => Ok(Self::Scheduled),
            "manual" => Ok(Self::Manual),
            _ => Err(SettingsError::InvalidEnumValue {
                setting: "sync mode",
                value: raw.to_string(),
            }),
        }
    }

    /// Stable tag used in the store and on the wire.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }

    /// Display label for settings screens.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Push => "Push",
            Self::Scheduled => "Scheduled",
            Self::Manual => "Manual",
        }
    }
}

/// Normalize the raw account type and sync mode tags of a stored record.
pub fn normalize(raw_account_type: &str, raw_sync_mode: &str) -> (AccountType, SyncMode) {
    (
        AccountType::normalize(raw_account_type),
        SyncMode::normalize(raw_sync_mode),
    )
}

/// Applicability rule for the polling interval.
///
/// Exchange accounts poll only in scheduled mode; every other account type
/// always polls. Callers must use this instead of re-deriving the rule.
pub fn interval_applicable(account_type: AccountType, sync_mode: SyncMode) -> bool {
    account_type != AccountType::Exchange || sync_mode == SyncMode::Scheduled
}

/// Day-interval settings: PIM sync cadences and auto-cleanup retention.
/// A value of 0 disables the corresponding sync or cleanup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntervalField {
    Contacts,
    Notes,
    Calendar,
    Tasks,
    CleanupTrash,
    CleanupDrafts,
    CleanupSpam,
}

impl IntervalField {
    pub const ALL: [IntervalField; 7] = [
        Self::Contacts,
        Self::Notes,
        Self::Calendar,
        Self::Tasks,
        Self::CleanupTrash,
        Self::CleanupDrafts,
        Self::CleanupSpam,
    ];

    /// Whether this is a PIM sync cadence, meaningful for Exchange only.
    /// Cleanup retentions apply to every account type.
    pub fn exchange_only(&self) -> bool {
        matches!(
            self,
            Self::Contacts | Self::Notes | Self::Calendar | Self::Tasks
        )
    }

    /// Setting name used in validation errors.
    pub fn setting_name(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts sync interval",
            Self::Notes => "notes sync interval",
            Self::Calendar => "calendar sync interval",
            Self::Tasks => "tasks sync interval",
            Self::CleanupTrash => "trash cleanup retention",
            Self::CleanupDrafts => "drafts cleanup retention",
            Self::CleanupSpam => "spam cleanup retention",
        }
    }

    /// Display label for settings screens.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Contacts => "Sync contacts",
            Self::Notes => "Sync notes",
            Self::Calendar => "Sync calendar",
            Self::Tasks => "Sync tasks",
            Self::CleanupTrash => "Clean up trash",
            Self::CleanupDrafts => "Clean up drafts",
            Self::CleanupSpam => "Clean up spam",
        }
    }
}

/// One account's sync and cleanup configuration.
///
/// Snapshots are immutable: updates go through the `with_*` operations in
/// [`crate::reconcile`], which return the next snapshot plus the side-effect
/// intents the change requires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSyncConfig {
    pub account_id: String,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub sync_mode: SyncMode,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u32,
    #[serde(default)]
    pub night_mode_enabled: bool,
    #[serde(default)]
    pub ignore_battery_saver: bool,
    #[serde(default = "default_pim_days")]
    pub contacts_sync_days: u32,
    #[serde(default = "default_pim_days")]
    pub notes_sync_days: u32,
    #[serde(default = "default_pim_days")]
    pub calendar_sync_days: u32,
    #[serde(default = "default_pim_days")]
    pub tasks_sync_days: u32,
    #[serde(default)]
    pub cleanup_trash_days: u32,
    #[serde(default)]
    pub cleanup_drafts_days: u32,
    #[serde(default)]
    pub cleanup_spam_days: u32,
}

fn default_sync_interval() -> u32 {
    DEFAULT_SYNC_INTERVAL_MINUTES
}

fn default_pim_days() -> u32 {
    DEFAULT_PIM_SYNC_DAYS
}

impl AccountSyncConfig {
    /// New account with default settings for its type.
    pub fn new(account_id: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            account_id: account_id.into(),
            account_type,
            sync_mode: SyncMode::default(),
            sync_interval_minutes: default_sync_interval(),
            night_mode_enabled: false,
            ignore_battery_saver: false,
            contacts_sync_days: default_pim_days(),
            notes_sync_days: default_pim_days(),
            calendar_sync_days: default_pim_days(),
            tasks_sync_days: default_pim_days(),
            cleanup_trash_days: 0,
            cleanup_drafts_days: 0,
            cleanup_spam_days: 0,
        }
    }

    /// Whether the polling interval is meaningful for this configuration.
    pub fn interval_applicable(&self) -> bool {
        interval_applicable(self.account_type, self.sync_mode)
    }

    /// Current value of a day-interval setting.
    pub fn interval_days(&self, field: IntervalField) -> u32 {
        match field {
            IntervalField::Contacts => self.contacts_sync_days,
            IntervalField::Notes => self.notes_sync_days,
            IntervalField::Calendar => self.calendar_sync_days,
            IntervalField::Tasks => self.tasks_sync_days,
            IntervalField::CleanupTrash => self.cleanup_trash_days,
            IntervalField::CleanupDrafts => self.cleanup_drafts_days,
            IntervalField::CleanupSpam => self.cleanup_spam_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unknown_tags_fall_back_to_defaults() {
        for raw in ["", "eas", "exchnage", "IMAP4rev2", "🤷", "null"] {
            assert_eq!(AccountType::normalize(raw), AccountType::Exchange, "{raw}");
        }
        for raw in ["", "pull", "periodic", "invalid_tag", "PUSHY"] {
            assert_eq!(SyncMode::normalize(raw), SyncMode::Push, "{raw}");
        }

        assert_eq!(
            normalize("imap", "scheduled"),
            (AccountType::Imap, SyncMode::Scheduled)
        );
        assert_eq!(
            normalize("garbage", "garbage"),
            (AccountType::Exchange, SyncMode::Push)
        );
    }

    #[test]
    fn test_normalize_is_case_and_whitespace_tolerant() {
        assert_eq!(AccountType::normalize(" Exchange "), AccountType::Exchange);
        assert_eq!(AccountType::normalize("POP3"), AccountType::Pop3);
        assert_eq!(SyncMode::normalize("Scheduled"), SyncMode::Scheduled);
    }

    #[test]
    fn test_strict_parse_rejects_unknown_tags() {
        assert!(matches!(
            AccountType::parse("eas"),
            Err(SettingsError::InvalidEnumValue { .. })
        ));
        assert!(matches!(
            SyncMode::parse("pull"),
            Err(SettingsError::InvalidEnumValue { .. })
        ));
        assert_eq!(SyncMode::parse("manual").unwrap(), SyncMode::Manual);
    }

    #[test]
    fn test_interval_applicability_rule() {
        assert!(!interval_applicable(AccountType::Exchange, SyncMode::Push));
        assert!(!interval_applicable(AccountType::Exchange, SyncMode::Manual));
        assert!(interval_applicable(AccountType::Exchange, SyncMode::Scheduled));
        for mode in [SyncMode::Push, SyncMode::Scheduled, SyncMode::Manual] {
            assert!(interval_applicable(AccountType::Imap, mode));
            assert!(interval_applicable(AccountType::Pop3, mode));
        }
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            account_id = "work@example.com"
            account_type = "imap"
        "#;

        let config: AccountSyncConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.account_type, AccountType::Imap);
        assert_eq!(config.sync_mode, SyncMode::Push);
        assert_eq!(config.sync_interval_minutes, DEFAULT_SYNC_INTERVAL_MINUTES);
        assert!(!config.night_mode_enabled);
        assert_eq!(config.contacts_sync_days, DEFAULT_PIM_SYNC_DAYS);
        assert_eq!(config.cleanup_trash_days, 0);
    }

    #[test]
    fn test_interval_days_accessor_covers_every_field() {
        let mut config = AccountSyncConfig::new("a@example.com", AccountType::Exchange);
        config.contacts_sync_days = 2;
        config.cleanup_spam_days = 30;

        assert_eq!(config.interval_days(IntervalField::Contacts), 2);
        assert_eq!(config.interval_days(IntervalField::CleanupSpam), 30);
        assert_eq!(config.interval_days(IntervalField::Notes), 1);
        assert_eq!(config.interval_days(IntervalField::CleanupTrash), 0);
    }
}
