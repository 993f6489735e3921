use crate::app::{
    dispatcher::UpdateDispatcher,
    history_storage::HistoryStorage,
    messenger::Messenger,
    update_source::UpdateSource,
};
use std::{
    path::Path,
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
    prelude::*,
};

pub mod dispatcher;
pub mod file_history_storage;
pub mod gold_run;
pub mod histogram;
pub mod history_storage;
pub mod in_memory_history_storage;
pub mod messenger;
pub mod narrative;
pub mod spammer;
pub mod summary;
pub mod telegram;
pub mod update_source;


const DEFAULT_LOG_FILTER: &str = "info,slot_bot=debug";

/// Pause after a failed fetch so an unreachable remote doesn't turn into a busy loop.
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(1);

pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let stdout = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());
    match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(rolling::daily(dir, "slot-bot.log"));
            let _ = stdout
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init();
            Some(guard)
        }
        None => {
            let _ = stdout.try_init();
            None
        }
    }
}

/// Sleep for `duration`, returning `false` early if `token` gets cancelled.
pub async fn pause(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Continue,
    Exit,
}

/// The update polling loop. Owns the cursor into the remote update queue.
pub struct App<Updates, M, S> {
    updates: Updates,
    dispatcher: UpdateDispatcher<M, S>,
    cursor: Option<i64>,
}

impl<Updates, M, S> App<Updates, M, S> {
    pub fn new(updates: Updates, dispatcher: UpdateDispatcher<M, S>) -> Self {
        Self {
            updates,
            dispatcher,
            cursor: None,
        }
    }

    /// Id of the last update handed to the dispatcher.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn dispatcher(&self) -> &UpdateDispatcher<M, S> {
        &self.dispatcher
    }
}

impl<Updates: UpdateSource, M: Messenger, S: HistoryStorage> App<Updates, M, S> {
    /// Run one polling iteration, or return `Exit` once `interrupt` resolves.
    pub async fn run(&mut self, interrupt: impl Future<Output = ()>) -> RunState {
        tokio::select! {
            biased;
            _ = interrupt => {
                self.dispatcher.spammer().stop().await;
                RunState::Exit
            }
            _ = self.poll_once() => RunState::Continue,
        }
    }

    pub async fn poll_once(&mut self) {
        let offset = self.cursor.map(|cursor| cursor + 1);
        let updates = match self.updates.fetch_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::error!("Could not fetch updates (offset {:?}): {e}", offset);
                tokio::time::sleep(FETCH_RETRY_DELAY).await;
                return;
            }
        };
        for update in updates {
            if let Err(e) = self.dispatcher.handle_update(&update).await {
                tracing::error!("Could not handle update {}: {e}", update.update_id);
            }
            self.cursor = Some(update.update_id);
        }
    }
}
