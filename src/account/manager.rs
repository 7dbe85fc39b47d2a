use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use crate::actor::retry::RetryPolicy;
use crate::error::SettingsError;
use crate::scheduler::{PushChannel, SyncScheduler};
use crate::settings::{AccountSyncConfig, AccountType};
use crate::store::SqliteStore;

use super::handle::AccountHandle;
use super::worker::{SettingsUpdate, spawn_settings_worker};

/// Owns the settings store, the collaborator handles, and one worker per
/// account with pending or recent edits.
///
/// Workers are spawned lazily on first edit and keep the per-account intent
/// pipeline serialized; unrelated accounts' pipelines run concurrently.
pub struct AccountManager {
    handles: HashMap<String, AccountHandle>,
    store: Arc<SqliteStore>,
    push: Arc<dyn PushChannel>,
    scheduler: Arc<dyn SyncScheduler>,
    retry: RetryPolicy,
}

impl AccountManager {
    pub fn new(
        store: Arc<SqliteStore>,
        push: Arc<dyn PushChannel>,
        scheduler: Arc<dyn SyncScheduler>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            handles: HashMap::new(),
            store,
            push,
            scheduler,
            retry,
        }
    }

    /// Create an account with default settings for its type.
    pub async fn create_account(
        &self,
        account_id: &str,
        account_type: AccountType,
    ) -> Result<AccountSyncConfig> {
        if self.store.get(account_id).await?.is_some() {
            return Err(SettingsError::AccountExists(account_id.to_string()).into());
        }

        let config = AccountSyncConfig::new(account_id, account_type);
        self.store.insert(&config).await?;
        tracing::info!("created account '{}' ({})", account_id, account_type.label());
        Ok(config)
    }

    /// Remove an account: stop its worker, then delete the stored record.
    pub async fn remove_account(&mut self, account_id: &str) -> Result<()> {
        if let Some(handle) = self.handles.remove(account_id) {
            handle.shutdown().await;
        }

        if !self.store.delete(account_id).await? {
            return Err(SettingsError::AccountNotFound(account_id.to_string()).into());
        }

        tracing::info!("removed account '{}'", account_id);
        Ok(())
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Option<AccountSyncConfig>> {
        self.store.get(account_id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountSyncConfig>> {
        self.store.list().await
    }

    /// Get the settings worker handle for an account, spawning it on first
    /// use from the stored (normalized) configuration.
    pub async fn handle_mut(&mut self, account_id: &str) -> Result<&mut AccountHandle> {
        if !self.handles.contains_key(account_id) {
            let config = self
                .store
                .get(account_id)
                .await?
                .ok_or_else(|| SettingsError::AccountNotFound(account_id.to_string()))?;

            let handle = spawn_settings_worker(
                config,
                Arc::clone(&self.store),
                Arc::clone(&self.push),
                Arc::clone(&self.scheduler),
                self.retry.clone(),
            );
            self.handles.insert(account_id.to_string(), handle);
        }

        match self.handles.get_mut(account_id) {
            Some(handle) => Ok(handle),
            None => Err(SettingsError::AccountNotFound(account_id.to_string()).into()),
        }
    }

    /// Apply a settings update to an account and wait for the outcome.
    pub async fn update(
        &mut self,
        account_id: &str,
        update: SettingsUpdate,
    ) -> Result<AccountSyncConfig, SettingsError> {
        let handle = self
            .handle_mut(account_id)
            .await
            .map_err(|e| match e.downcast::<SettingsError>() {
                Ok(err) => err,
                Err(other) => SettingsError::Store(format!("{other:#}")),
            })?;

        handle.apply(update).await
    }

    /// Stop all workers.
    pub async fn shutdown(&mut self) {
        for handle in self.handles.values() {
            handle.shutdown().await;
        }
        self.handles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{SettingsCommand, SettingsEvent};
    use crate::settings::{IntervalField, SyncMode};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TEST_ACCOUNT: &str = "user@example.com";

    #[derive(Default)]
    struct RecordingPush {
        actions: Mutex<Vec<&'static str>>,
    }

    impl PushChannel for RecordingPush {
        fn start(&self, _ctx: &crate::scheduler::ScheduleContext) -> Result<()> {
            self.actions.lock().unwrap().push("start");
            Ok(())
        }

        fn stop(&self, _ctx: &crate::scheduler::ScheduleContext) -> Result<()> {
            self.actions.lock().unwrap().push("stop");
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingScheduler {
        calls: AtomicU32,
    }

    impl SyncScheduler for RecordingScheduler {
        fn schedule_with_night_mode(&self, _ctx: &crate::scheduler::ScheduleContext) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails the first `fail_times` calls, then succeeds.
    struct FlakyScheduler {
        calls: AtomicU32,
        fail_times: u32,
    }

    impl SyncScheduler for FlakyScheduler {
        fn schedule_with_night_mode(&self, _ctx: &crate::scheduler::ScheduleContext) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_times {
                anyhow::bail!("scheduler unavailable");
            }
            Ok(())
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_delay_ms: 1,
            max_delay_secs: 1,
        }
    }

    async fn manager_with(
        push: Arc<dyn PushChannel>,
        scheduler: Arc<dyn SyncScheduler>,
    ) -> AccountManager {
        let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
        AccountManager::new(store, push, scheduler, fast_retry())
    }

    #[tokio::test]
    async fn test_mode_change_persists_stops_push_and_replans() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut manager = manager_with(push.clone(), scheduler.clone()).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Exchange)
            .await
            .unwrap();

        let updated = manager
            .update(TEST_ACCOUNT, SettingsUpdate::SyncMode(SyncMode::Scheduled))
            .await
            .unwrap();
        assert_eq!(updated.sync_mode, SyncMode::Scheduled);
        assert!(updated.interval_applicable());

        // The change is durable, not just in the worker's snapshot.
        let stored = manager.get_account(TEST_ACCOUNT).await.unwrap().unwrap();
        assert_eq!(stored.sync_mode, SyncMode::Scheduled);

        assert_eq!(*push.actions.lock().unwrap(), vec!["stop"]);
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 1);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_mode_change_to_push_starts_channel() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut manager = manager_with(push.clone(), scheduler.clone()).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Exchange)
            .await
            .unwrap();

        manager
            .update(TEST_ACCOUNT, SettingsUpdate::SyncMode(SyncMode::Scheduled))
            .await
            .unwrap();
        manager
            .update(TEST_ACCOUNT, SettingsUpdate::SyncMode(SyncMode::Push))
            .await
            .unwrap();

        assert_eq!(*push.actions.lock().unwrap(), vec!["stop", "start"]);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_interval_rejected_without_side_effects() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut manager = manager_with(push.clone(), scheduler.clone()).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Imap)
            .await
            .unwrap();

        let err = manager
            .update(TEST_ACCOUNT, SettingsUpdate::SyncIntervalMinutes(7))
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidEnumValue { .. }));

        let stored = manager.get_account(TEST_ACCOUNT).await.unwrap().unwrap();
        assert_eq!(stored.sync_interval_minutes, 15);
        assert!(push.actions.lock().unwrap().is_empty());
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 0);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_toggles_replan_but_day_intervals_do_not() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut manager = manager_with(push.clone(), scheduler.clone()).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Exchange)
            .await
            .unwrap();

        manager
            .update(TEST_ACCOUNT, SettingsUpdate::NightModeEnabled(true))
            .await
            .unwrap();
        manager
            .update(TEST_ACCOUNT, SettingsUpdate::IgnoreBatterySaver(true))
            .await
            .unwrap();
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 2);

        let updated = manager
            .update(
                TEST_ACCOUNT,
                SettingsUpdate::IntervalDays(IntervalField::CleanupTrash, 30),
            )
            .await
            .unwrap();
        assert_eq!(updated.cleanup_trash_days, 30);

        // Day intervals never touch the push channel or the scheduler.
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 2);
        assert!(push.actions.lock().unwrap().is_empty());

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_negative_days_rejected() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut manager = manager_with(push, scheduler).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Exchange)
            .await
            .unwrap();

        let err = manager
            .update(
                TEST_ACCOUNT,
                SettingsUpdate::IntervalDays(IntervalField::Contacts, -1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidRange { .. }));

        let stored = manager.get_account(TEST_ACCOUNT).await.unwrap().unwrap();
        assert_eq!(stored.contacts_sync_days, 1);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_flaky_scheduler_is_retried() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(FlakyScheduler {
            calls: AtomicU32::new(0),
            fail_times: 2,
        });
        let mut manager = manager_with(push, scheduler.clone()).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Exchange)
            .await
            .unwrap();

        let updated = manager
            .update(TEST_ACCOUNT, SettingsUpdate::NightModeEnabled(true))
            .await
            .unwrap();
        assert!(updated.night_mode_enabled);
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 3);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_persist_failure_skips_dependent_intents() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut manager = manager_with(push.clone(), scheduler.clone()).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Exchange)
            .await
            .unwrap();

        // Spawn the worker, then delete the stored row behind its back so
        // the next persist cannot land.
        manager.handle_mut(TEST_ACCOUNT).await.unwrap();
        manager.store.delete(TEST_ACCOUNT).await.unwrap();

        let err = manager
            .update(TEST_ACCOUNT, SettingsUpdate::SyncMode(SyncMode::Scheduled))
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::PersistFailed(_)));

        assert!(push.actions.lock().unwrap().is_empty());
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 0);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_account_lifecycle() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut manager = manager_with(push, scheduler).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Pop3)
            .await
            .unwrap();
        let err = manager
            .create_account(TEST_ACCOUNT, AccountType::Pop3)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SettingsError>(),
            Some(SettingsError::AccountExists(_))
        ));

        assert_eq!(manager.list_accounts().await.unwrap().len(), 1);

        manager.remove_account(TEST_ACCOUNT).await.unwrap();
        assert!(manager.get_account(TEST_ACCOUNT).await.unwrap().is_none());

        let err = manager.remove_account(TEST_ACCOUNT).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SettingsError>(),
            Some(SettingsError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_updates_to_same_account_apply_in_order() {
        let push = Arc::new(RecordingPush::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut manager = manager_with(push, scheduler).await;

        manager
            .create_account(TEST_ACCOUNT, AccountType::Imap)
            .await
            .unwrap();

        // Queue several edits through the handle without waiting in between;
        // the worker drains them one at a time, in order.
        let handle = manager.handle_mut(TEST_ACCOUNT).await.unwrap();
        for minutes in [1, 5, 30] {
            handle
                .cmd_tx
                .send(SettingsCommand::Apply(SettingsUpdate::SyncIntervalMinutes(
                    minutes,
                )))
                .await
                .unwrap();
        }

        let mut last = None;
        for _ in 0..3 {
            match handle.event_rx.recv().await {
                Some(SettingsEvent::Updated { config }) => last = Some(config),
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(last.unwrap().sync_interval_minutes, 30);

        let stored = manager.get_account(TEST_ACCOUNT).await.unwrap().unwrap();
        assert_eq!(stored.sync_interval_minutes, 30);

        manager.shutdown().await;
    }
}
