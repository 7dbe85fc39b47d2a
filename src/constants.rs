//! Crate-wide constants for interval choices, defaults, and worker tuning.
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Polling interval choices offered for scheduled sync, in minutes.
/// The settings UI presents exactly this set.
pub const SYNC_INTERVAL_CHOICES: [u32; 7] = [1, 2, 3, 5, 10, 15, 30];

/// Default polling interval in minutes for a new account.
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 15;

/// Default PIM sync cadence in days for a new Exchange account (0 = disabled).
pub const DEFAULT_PIM_SYNC_DAYS: u32 = 1;

/// Maximum number of retries when executing a persist or scheduler intent.
pub const INTENT_MAX_RETRIES: u32 = 3;

/// Delay in milliseconds before the first intent retry.
pub const INTENT_RETRY_DELAY_MS: u64 = 250;

/// Maximum backoff delay in seconds between intent retries.
pub const INTENT_MAX_RETRY_DELAY_SECS: u64 = 10;

/// Capacity of the per-account command channel.
pub const WORKER_CMD_CAPACITY: usize = 32;

/// Capacity of the per-account event channel.
pub const WORKER_EVENT_CAPACITY: usize = 64;
