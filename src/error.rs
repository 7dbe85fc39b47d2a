use thiserror::Error;

/// Errors surfaced by the settings model and the account manager.
///
/// Validation failures are rejected before any intent is produced, so an
/// invalid update never partially mutates a configuration snapshot.
/// Unrecognized *stored* enum tags are deliberately not represented here:
/// loading normalizes them to documented defaults instead of failing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// A proposed value is outside the fixed set the setting accepts.
    #[error("invalid value `{value}` for {setting}")]
    InvalidEnumValue {
        setting: &'static str,
        value: String,
    },

    /// A proposed day count is negative or absurdly large.
    #[error("{setting} out of range: {value}")]
    InvalidRange { setting: &'static str, value: i64 },

    #[error("unknown account: {0}")]
    AccountNotFound(String),

    #[error("account already exists: {0}")]
    AccountExists(String),

    /// Persistence failed after retries; stored and in-memory state are
    /// unchanged.
    #[error("failed to persist settings: {0}")]
    PersistFailed(String),

    /// The settings store could not be read.
    #[error("settings store error: {0}")]
    Store(String),

    /// The per-account worker has shut down and no longer accepts updates.
    #[error("settings worker for account {0} is gone")]
    WorkerClosed(String),
}
