//! Per-account mail synchronization and cleanup settings.
//!
//! `syncplan` models one account's sync configuration (sync mode, polling
//! interval, night mode, battery-saver override, PIM sync and auto-cleanup
//! intervals), normalizes raw stored values, and computes the ordered
//! side-effect intents (persist, push channel start/stop, scheduler re-plan)
//! each settings change requires. Intents are executed by per-account worker
//! tasks so that edits to the same account never race.

pub mod account;
pub mod actor;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod reconcile;
pub mod scheduler;
pub mod settings;
pub mod store;

pub use account::{AccountHandle, AccountManager, SettingsEvent, SettingsUpdate};
pub use editor::ActiveEditor;
pub use error::SettingsError;
pub use reconcile::{FieldChange, Intent, PushChannelAction};
pub use scheduler::{
    LoggingPushChannel, LoggingScheduler, PushChannel, ScheduleContext, SyncScheduler,
};
pub use settings::{AccountSyncConfig, AccountType, IntervalField, SyncMode, normalize};
pub use store::SqliteStore;
