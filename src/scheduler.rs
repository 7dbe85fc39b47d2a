//! Collaborator seams: the push channel and the background sync planner.
//!
//! Both collaborators are idempotent by contract, so the orchestrator may
//! re-issue a call after a partial failure without changing the outcome.

use anyhow::Result;

use crate::settings::{AccountSyncConfig, SyncMode};

/// Everything the scheduler and push channel need to (re)plan one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleContext {
    pub account_id: String,
    pub sync_mode: SyncMode,
    /// Polling cadence in minutes; `None` when the interval is not applicable
    /// (Exchange account in push or manual mode).
    pub sync_interval_minutes: Option<u32>,
    pub night_mode_enabled: bool,
    pub ignore_battery_saver: bool,
}

impl ScheduleContext {
    pub fn for_account(config: &AccountSyncConfig) -> Self {
        Self {
            account_id: config.account_id.clone(),
            sync_mode: config.sync_mode,
            sync_interval_minutes: config
                .interval_applicable()
                .then_some(config.sync_interval_minutes),
            night_mode_enabled: config.night_mode_enabled,
            ignore_battery_saver: config.ignore_battery_saver,
        }
    }
}

/// Server push channel control.
///
/// Implementations must be idempotent: starting an already-running channel or
/// stopping a stopped one is a no-op.
pub trait PushChannel: Send + Sync {
    fn start(&self, ctx: &ScheduleContext) -> Result<()>;
    fn stop(&self, ctx: &ScheduleContext) -> Result<()>;
}

/// Background sync planner.
///
/// `schedule_with_night_mode` recomputes the next sync run from the account's
/// persisted settings, honoring night mode and the battery-saver override.
/// Redundant calls are safe.
pub trait SyncScheduler: Send + Sync {
    fn schedule_with_night_mode(&self, ctx: &ScheduleContext) -> Result<()>;
}

/// Push channel that only logs. For hosts without a live push transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPushChannel;

impl PushChannel for LoggingPushChannel {
    fn start(&self, ctx: &ScheduleContext) -> Result<()> {
        tracing::info!("starting push channel for account '{}'", ctx.account_id);
        Ok(())
    }

    fn stop(&self, ctx: &ScheduleContext) -> Result<()> {
        tracing::info!("stopping push channel for account '{}'", ctx.account_id);
        Ok(())
    }
}

/// Scheduler that only logs the computed plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingScheduler;

impl SyncScheduler for LoggingScheduler {
    fn schedule_with_night_mode(&self, ctx: &ScheduleContext) -> Result<()> {
        match ctx.sync_interval_minutes {
            Some(minutes) => tracing::info!(
                "replanning '{}': poll every {} min, night mode {}, ignore battery saver {}",
                ctx.account_id,
                minutes,
                ctx.night_mode_enabled,
                ctx.ignore_battery_saver
            ),
            None => tracing::info!(
                "replanning '{}': {} mode, night mode {}, ignore battery saver {}",
                ctx.account_id,
                ctx.sync_mode.label(),
                ctx.night_mode_enabled,
                ctx.ignore_battery_saver
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AccountSyncConfig, AccountType};

    #[test]
    fn test_context_omits_interval_when_not_applicable() {
        let config = AccountSyncConfig::new("user@example.com", AccountType::Exchange);
        let ctx = ScheduleContext::for_account(&config);
        assert_eq!(ctx.sync_interval_minutes, None);

        let (scheduled, _) = config.with_sync_mode(SyncMode::Scheduled);
        let ctx = ScheduleContext::for_account(&scheduled);
        assert_eq!(ctx.sync_interval_minutes, Some(15));

        let imap = AccountSyncConfig::new("other@example.com", AccountType::Imap);
        let ctx = ScheduleContext::for_account(&imap);
        assert_eq!(ctx.sync_interval_minutes, Some(15));
    }

    #[test]
    fn test_logging_collaborators_are_idempotent() {
        let config = AccountSyncConfig::new("user@example.com", AccountType::Exchange);
        let ctx = ScheduleContext::for_account(&config);

        let push = LoggingPushChannel;
        assert!(push.start(&ctx).is_ok());
        assert!(push.start(&ctx).is_ok());
        assert!(push.stop(&ctx).is_ok());
        assert!(push.stop(&ctx).is_ok());

        let scheduler = LoggingScheduler;
        assert!(scheduler.schedule_with_night_mode(&ctx).is_ok());
        assert!(scheduler.schedule_with_night_mode(&ctx).is_ok());
    }
}
