//! Settings worker actor: applies updates and executes their intents.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::actor::retry::{RetryPolicy, with_retry};
use crate::constants::{WORKER_CMD_CAPACITY, WORKER_EVENT_CAPACITY};
use crate::error::SettingsError;
use crate::reconcile::{Intent, PushChannelAction};
use crate::scheduler::{PushChannel, ScheduleContext, SyncScheduler};
use crate::settings::{AccountSyncConfig, IntervalField, SyncMode};
use crate::store::SqliteStore;

use super::AccountHandle;

/// A single settings change requested by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsUpdate {
    SyncMode(SyncMode),
    SyncIntervalMinutes(u32),
    NightModeEnabled(bool),
    IgnoreBatterySaver(bool),
    /// Day count is validated by the model; negatives are rejected there.
    IntervalDays(IntervalField, i64),
}

/// Commands sent TO the settings worker
#[derive(Debug)]
pub enum SettingsCommand {
    Apply(SettingsUpdate),
    Shutdown,
}

/// Events sent FROM the settings worker
#[derive(Debug, Clone)]
pub enum SettingsEvent {
    /// The update was validated, persisted, and its follow-up intents issued.
    Updated { config: AccountSyncConfig },
    /// The update failed validation; nothing was persisted.
    Rejected { error: SettingsError },
    /// Persistence failed after retries; stored and in-memory state are
    /// unchanged and no follow-up intent was issued.
    PersistFailed { error: String },
}

/// Spawn the settings worker for one account and return a handle to it.
pub fn spawn_settings_worker(
    config: AccountSyncConfig,
    store: Arc<SqliteStore>,
    push: Arc<dyn PushChannel>,
    scheduler: Arc<dyn SyncScheduler>,
    retry: RetryPolicy,
) -> AccountHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(WORKER_CMD_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(WORKER_EVENT_CAPACITY);
    let account_id = config.account_id.clone();

    tokio::spawn(settings_worker(
        config, store, push, scheduler, retry, cmd_rx, event_tx,
    ));

    AccountHandle::new(account_id, cmd_tx, event_rx)
}

/// The worker loop. Commands are applied strictly in arrival order.
async fn settings_worker(
    mut config: AccountSyncConfig,
    store: Arc<SqliteStore>,
    push: Arc<dyn PushChannel>,
    scheduler: Arc<dyn SyncScheduler>,
    retry: RetryPolicy,
    mut cmd_rx: mpsc::Receiver<SettingsCommand>,
    event_tx: mpsc::Sender<SettingsEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            SettingsCommand::Shutdown => break,
            SettingsCommand::Apply(update) => {
                let event = apply_update(
                    &mut config,
                    &store,
                    push.as_ref(),
                    scheduler.as_ref(),
                    &retry,
                    update,
                )
                .await;

                if event_tx.send(event).await.is_err() {
                    tracing::debug!(
                        "event receiver for account '{}' dropped",
                        config.account_id
                    );
                }
            }
        }
    }

    tracing::info!("settings worker for account '{}' stopped", config.account_id);
}

/// Apply one update: reconcile, persist, then issue the follow-up intents.
///
/// The snapshot only advances once the persist intent lands; a persist
/// failure skips the dependent intents entirely.
async fn apply_update(
    config: &mut AccountSyncConfig,
    store: &SqliteStore,
    push: &dyn PushChannel,
    scheduler: &dyn SyncScheduler,
    retry: &RetryPolicy,
    update: SettingsUpdate,
) -> SettingsEvent {
    let result = match update {
        SettingsUpdate::SyncMode(mode) => Ok(config.with_sync_mode(mode)),
        SettingsUpdate::SyncIntervalMinutes(minutes) => config.with_sync_interval(minutes),
        SettingsUpdate::NightModeEnabled(enabled) => Ok(config.with_night_mode(enabled)),
        SettingsUpdate::IgnoreBatterySaver(ignore) => Ok(config.with_ignore_battery_saver(ignore)),
        SettingsUpdate::IntervalDays(field, days) => config.with_interval_days(field, days),
    };

    let (next, intents) = match result {
        Ok(pair) => pair,
        Err(error) => {
            tracing::debug!(
                "rejected update for account '{}': {}",
                config.account_id,
                error
            );
            return SettingsEvent::Rejected { error };
        }
    };

    for intent in &intents {
        if let Intent::Persist(change) = intent {
            let persisted =
                with_retry(retry, || store.update_field(&config.account_id, change)).await;

            if let Err(error) = persisted {
                tracing::warn!(
                    "persist failed for account '{}': {:#}",
                    config.account_id,
                    error
                );
                return SettingsEvent::PersistFailed {
                    error: format!("{error:#}"),
                };
            }
        }
    }

    *config = next;
    let ctx = ScheduleContext::for_account(config);

    for intent in &intents {
        match intent {
            Intent::Persist(_) => {}
            Intent::PushChannel(action) => {
                let outcome = with_retry(retry, || async {
                    match action {
                        PushChannelAction::Start => push.start(&ctx),
                        PushChannelAction::Stop => push.stop(&ctx),
                    }
                })
                .await;

                if let Err(error) = outcome {
                    tracing::warn!(
                        "push channel {:?} failed for account '{}': {:#}",
                        action,
                        ctx.account_id,
                        error
                    );
                }
            }
            Intent::Reschedule => {
                let outcome =
                    with_retry(retry, || async { scheduler.schedule_with_night_mode(&ctx) }).await;

                if let Err(error) = outcome {
                    tracing::warn!(
                        "reschedule failed for account '{}': {:#}",
                        ctx.account_id,
                        error
                    );
                }
            }
        }
    }

    SettingsEvent::Updated {
        config: config.clone(),
    }
}
