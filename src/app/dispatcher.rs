use crate::{
    Error,
    Result,
    app::{
        histogram,
        history_storage::HistoryStorage,
        messenger::Messenger,
        spammer::SpamController,
        summary::Summary,
    },
    config::Config,
    history::History,
    slots::Reels,
    updates::{
        Message,
        Payload,
        Throw,
        ThrowKind,
        Update,
    },
};
use std::sync::Arc;

const START_SPAM_REBUFF: &str = "nah.";
const STOP_SPAM_REBUFF: &str = "no u";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Summary,
    StopSpam,
    Spam,
}

impl Command {
    /// Prefix match, so `/summary@SomeBot` works in groups.
    pub fn parse(text: &str) -> Option<Command> {
        if text.starts_with("/summary") {
            Some(Command::Summary)
        } else if text.starts_with("/stopspam") {
            Some(Command::StopSpam)
        } else if text.starts_with("/spam") {
            Some(Command::Spam)
        } else {
            None
        }
    }
}

/// Where a throw came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    /// Produced by the spammer.
    SelfTriggered,
}

/// Classifies inbound messages and acts on them.
pub struct UpdateDispatcher<M, S> {
    messenger: Arc<M>,
    history: Arc<History>,
    storage: Arc<S>,
    spammer: Arc<SpamController>,
    config: Arc<Config>,
}

impl<M, S> Clone for UpdateDispatcher<M, S> {
    fn clone(&self) -> Self {
        Self {
            messenger: self.messenger.clone(),
            history: self.history.clone(),
            storage: self.storage.clone(),
            spammer: self.spammer.clone(),
            config: self.config.clone(),
        }
    }
}

impl<M, S> UpdateDispatcher<M, S> {
    pub fn new(
        messenger: Arc<M>,
        history: Arc<History>,
        storage: Arc<S>,
        config: Arc<Config>,
    ) -> Self {
        let spammer = Arc::new(SpamController::new(config.spam));
        Self {
            messenger,
            history,
            storage,
            spammer,
            config,
        }
    }

    pub fn messenger(&self) -> &Arc<M> {
        &self.messenger
    }

    pub fn history(&self) -> &Arc<History> {
        &self.history
    }

    pub fn spammer(&self) -> &Arc<SpamController> {
        &self.spammer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<M: Messenger, S: HistoryStorage> UpdateDispatcher<M, S> {
    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        let Some(message) = &update.message else {
            tracing::debug!("Skipping non-message update {}", update.update_id);
            return Ok(());
        };
        match &message.payload {
            Payload::Throw(throw) => {
                self.record_throw(message, throw, Origin::Remote).await?;
            }
            Payload::Text(text) => match Command::parse(text) {
                Some(command) => self.handle_command(message, command).await?,
                None => tracing::trace!("Ignoring chatter in chat {}", message.chat_id),
            },
            Payload::Other => {
                tracing::debug!(
                    "Skipping non-dice and non-text message {}",
                    message.message_id
                );
            }
        }
        Ok(())
    }

    /// Count a slot machine throw and persist the new history. Returns the
    /// resolved reels, or `None` for throws of other kinds.
    pub async fn record_throw(
        &self,
        message: &Message,
        throw: &Throw,
        origin: Origin,
    ) -> Result<Option<Reels>> {
        if throw.kind() != Some(ThrowKind::SlotMachine) {
            tracing::debug!("Skipping non-slot-machine throw {}", throw.emoji);
            return Ok(None);
        }
        let reels = self.history.record(throw.value)?;
        if origin == Origin::SelfTriggered {
            self.history.record_self_triggered();
        }
        self.persist().await;
        if reels == [self.config.celebrated_symbol; 3] {
            self.celebrate(message).await;
        }
        Ok(Some(reels))
    }

    /// The in-memory history stays authoritative when the write fails.
    async fn persist(&self) {
        let storage = self.storage.clone();
        let history = self.history.clone();
        match tokio::task::spawn_blocking(move || storage.store(&history)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Could not persist history: {e}"),
            Err(e) => tracing::error!("History write did not complete: {e}"),
        }
    }

    async fn celebrate(&self, message: &Message) {
        let sent = self
            .messenger
            .send_existing_image(
                message.chat_id,
                &self.config.celebration_file_id,
                Some(message.message_id),
            )
            .await;
        if let Err(e) = sent {
            tracing::error!("Could not send celebration image: {e}");
        }
    }

    fn authorize(&self, message: &Message) -> Result<()> {
        if self.config.is_admin(message.sender_id) {
            Ok(())
        } else {
            Err(Error::Unauthorized {
                user_id: message.sender_id,
            })
        }
    }

    async fn handle_command(&self, message: &Message, command: Command) -> Result<()> {
        let rebuff = match command {
            Command::Summary => return self.send_summary(message).await,
            Command::StopSpam => STOP_SPAM_REBUFF,
            Command::Spam => START_SPAM_REBUFF,
        };
        if let Err(Error::Unauthorized { user_id }) = self.authorize(message) {
            tracing::info!("Non-admin user {user_id:?} tried {command:?}");
            self.messenger
                .send_text(message.chat_id, rebuff, Some(message.message_id))
                .await?;
            return Ok(());
        }
        match command {
            Command::StopSpam => {
                self.spammer.stop().await;
            }
            Command::Spam => {
                self.spammer.start(self.clone(), message.chat_id).await;
            }
            Command::Summary => {}
        }
        Ok(())
    }

    async fn send_summary(&self, message: &Message) -> Result<()> {
        let counts = self.history.counts();
        let text = Summary::collect(&counts).to_string();
        match histogram::render_png(&counts.by_outcome) {
            Ok(png) => {
                self.messenger
                    .send_image(message.chat_id, png, &text, Some(message.message_id))
                    .await?;
            }
            Err(e) => {
                tracing::warn!("Could not render histogram, sending text only: {e}");
                self.messenger
                    .send_text(message.chat_id, &text, Some(message.message_id))
                    .await?;
            }
        }
        Ok(())
    }
}
