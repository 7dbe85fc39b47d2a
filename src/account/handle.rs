use tokio::sync::mpsc;

use crate::error::SettingsError;
use crate::settings::AccountSyncConfig;

use super::worker::{SettingsCommand, SettingsEvent, SettingsUpdate};

/// Handle to one account's settings worker.
pub struct AccountHandle {
    /// Account identifier
    pub account_id: String,
    /// Command channel into the worker
    pub cmd_tx: mpsc::Sender<SettingsCommand>,
    /// Event channel out of the worker
    pub event_rx: mpsc::Receiver<SettingsEvent>,
    /// Last configuration the worker reported
    pub last_config: Option<AccountSyncConfig>,
    /// Last error the worker reported, if any
    pub last_error: Option<String>,
}

impl AccountHandle {
    pub fn new(
        account_id: String,
        cmd_tx: mpsc::Sender<SettingsCommand>,
        event_rx: mpsc::Receiver<SettingsEvent>,
    ) -> Self {
        Self {
            account_id,
            cmd_tx,
            event_rx,
            last_config: None,
            last_error: None,
        }
    }

    /// Send an update to the worker and wait for its verdict.
    pub async fn apply(
        &mut self,
        update: SettingsUpdate,
    ) -> Result<AccountSyncConfig, SettingsError> {
        self.cmd_tx
            .send(SettingsCommand::Apply(update))
            .await
            .map_err(|_| SettingsError::WorkerClosed(self.account_id.clone()))?;

        match self.event_rx.recv().await {
            Some(SettingsEvent::Updated { config }) => {
                self.last_config = Some(config.clone());
                self.last_error = None;
                Ok(config)
            }
            Some(SettingsEvent::Rejected { error }) => {
                self.last_error = Some(error.to_string());
                Err(error)
            }
            Some(SettingsEvent::PersistFailed { error }) => {
                self.last_error = Some(error.clone());
                Err(SettingsError::PersistFailed(error))
            }
            None => Err(SettingsError::WorkerClosed(self.account_id.clone())),
        }
    }

    /// Ask the worker to stop. Pending commands are still drained first.
    pub async fn shutdown(&self) {
        self.cmd_tx.send(SettingsCommand::Shutdown).await.ok();
    }
}
