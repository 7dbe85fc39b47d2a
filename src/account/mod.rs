//! Per-account settings orchestration.
//!
//! One worker task per account owns the authoritative configuration snapshot
//! and executes each change's intents in order: persist first, then the
//! push-channel and scheduler follow-ups. Routing every edit for an account
//! through its single worker serializes the intent pipeline, so two edits to
//! the same account can never interleave their persists.

mod handle;
mod manager;
mod worker;

pub use handle::AccountHandle;
pub use manager::AccountManager;
pub use worker::{SettingsCommand, SettingsEvent, SettingsUpdate, spawn_settings_worker};
