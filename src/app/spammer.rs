//! Spam mode: a background task that keeps pulling the slot machine lever.
//!
//! At most one task runs at a time. Stopping is cooperative: the task owns a
//! cancellation token and checks it before every throw and while sleeping, so
//! it winds down within one in-flight request after `stop`.
use crate::{
    Error,
    Result,
    app::{
        dispatcher::{
            Origin,
            UpdateDispatcher,
        },
        gold_run::{
            self,
            ThrowSource,
        },
        history_storage::HistoryStorage,
        messenger::Messenger,
        narrative,
        pause,
    },
    config::SpamConfig,
    slots::JACKPOT,
    updates::{
        Message,
        ThrowKind,
    },
};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

struct SpamSession {
    chat_id: i64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SpamSession {
    fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

pub struct SpamController {
    config: SpamConfig,
    session: Mutex<Option<SpamSession>>,
}

impl SpamController {
    pub fn new(config: SpamConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(SpamSession::is_running)
    }

    /// Start spamming `chat_id`. Returns `false` if a spam task is already running.
    pub async fn start<M: Messenger, S: HistoryStorage>(
        &self,
        dispatcher: UpdateDispatcher<M, S>,
        chat_id: i64,
    ) -> bool {
        let mut session = self.session.lock().await;
        if let Some(running) = session.as_ref().filter(|s| s.is_running()) {
            tracing::debug!("Already spamming chat {}", running.chat_id);
            return false;
        }
        let token = CancellationToken::new();
        let task_token = token.clone();
        let config = self.config;
        let handle = tokio::spawn(async move {
            tracing::info!("Started spamming chat {chat_id}");
            spam(dispatcher, chat_id, config, task_token).await;
            tracing::info!("Stopped spamming chat {chat_id}");
        });
        *session = Some(SpamSession {
            chat_id,
            token,
            handle,
        });
        true
    }

    /// Ask the running spam task to stop and give it a short grace period to
    /// exit. Returns `false` if nothing was running.
    pub async fn stop(&self) -> bool {
        let mut session = self.session.lock().await;
        let Some(mut current) = session.take_if(|s| s.is_running()) else {
            return false;
        };
        current.token.cancel();
        if tokio::time::timeout(self.config.stop_grace, &mut current.handle)
            .await
            .is_err()
        {
            tracing::warn!(
                "Spam task for chat {} still finishing a request, detaching it",
                current.chat_id
            );
        }
        true
    }
}

/// Throws into one chat, waiting out rate limits until cancelled.
pub struct RetryingThrower<M> {
    messenger: Arc<M>,
    chat_id: i64,
    reply_to: Option<i64>,
    cooldown: Duration,
    token: CancellationToken,
}

impl<M> RetryingThrower<M> {
    pub fn new(
        messenger: Arc<M>,
        chat_id: i64,
        cooldown: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            messenger,
            chat_id,
            reply_to: None,
            cooldown,
            token,
        }
    }

    pub fn replying_to(&self, message_id: i64) -> Self {
        Self {
            messenger: self.messenger.clone(),
            chat_id: self.chat_id,
            reply_to: Some(message_id),
            cooldown: self.cooldown,
            token: self.token.clone(),
        }
    }
}

impl<M: Messenger> ThrowSource for RetryingThrower<M> {
    async fn throw(&self, kind: ThrowKind) -> Result<Option<Message>> {
        while !self.token.is_cancelled() {
            match self
                .messenger
                .send_throw(self.chat_id, kind, self.reply_to)
                .await
            {
                Ok(message) => return Ok(Some(message)),
                Err(Error::RateLimited { retry_after }) => {
                    tracing::warn!(
                        "Waiting because of rate limit (remote asked for {retry_after:?}s)"
                    );
                    if !pause(&self.token, self.cooldown).await {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

async fn spam<M: Messenger, S: HistoryStorage>(
    dispatcher: UpdateDispatcher<M, S>,
    chat_id: i64,
    config: SpamConfig,
    token: CancellationToken,
) {
    let thrower = RetryingThrower::new(
        dispatcher.messenger().clone(),
        chat_id,
        config.rate_limit_cooldown,
        token.clone(),
    );
    while !token.is_cancelled() {
        let message = match thrower.throw(ThrowKind::SlotMachine).await {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Could not throw the slot machine, skipping this round: {e}");
                if !pause(&token, config.pacing).await {
                    return;
                }
                continue;
            }
        };
        let Some(throw) = message.throw() else {
            tracing::warn!("Remote answered a throw with a non-throw message");
            if !pause(&token, config.pacing).await {
                return;
            }
            continue;
        };
        if let Err(e) = dispatcher
            .record_throw(&message, throw, Origin::SelfTriggered)
            .await
        {
            tracing::error!("Could not record own throw: {e}");
        }
        if config.golden_mode
            && throw.value == JACKPOT
            && !go_for_gold(&dispatcher, &thrower, &message, config, &token).await
        {
            return;
        }
        if !pause(&token, config.pacing).await {
            return;
        }
    }
}

/// Play a gold run off the back of `trigger` and announce how it went.
/// Returns whether spamming should go on, which it does unless the run was
/// won or cancelled.
async fn go_for_gold<M: Messenger, S: HistoryStorage>(
    dispatcher: &UpdateDispatcher<M, S>,
    thrower: &RetryingThrower<M>,
    trigger: &Message,
    config: SpamConfig,
    token: &CancellationToken,
) -> bool {
    let outcome = trigger.throw().map_or(JACKPOT, |throw| throw.value);
    if !pause(token, config.pacing).await {
        return false;
    }
    let result = gold_run::try_for_gold(
        &thrower.replying_to(trigger.message_id),
        config.pacing,
        token,
    )
    .await;
    tracing::info!("Gold run ended at {}", result.stage);
    pause(token, config.pacing).await;
    let story = narrative::gold_run_narrative(&result, outcome);
    if let Err(e) = dispatcher
        .messenger()
        .send_text(trigger.chat_id, &story.text, story.reply_to)
        .await
    {
        tracing::error!("Could not announce gold run: {e}");
    }
    !result.is_won() && !result.abandoned
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::{
        app::in_memory_history_storage::InMemoryHistoryStorage,
        config::Config,
        history::History,
        test_helpers::{
            FakeMessenger,
            ScriptedThrow,
        },
    };

    const CHAT: i64 = 5;

    fn spam_config(golden_mode: bool) -> SpamConfig {
        SpamConfig {
            golden_mode,
            pacing: Duration::from_secs(5),
            rate_limit_cooldown: Duration::from_secs(60),
            stop_grace: Duration::from_millis(200),
        }
    }

    fn dispatcher(
        messenger: Arc<FakeMessenger>,
        spam: SpamConfig,
    ) -> UpdateDispatcher<FakeMessenger, InMemoryHistoryStorage> {
        let config = Config {
            spam,
            ..Config::default()
        };
        UpdateDispatcher::new(
            messenger,
            Arc::new(History::new()),
            Arc::new(InMemoryHistoryStorage::new()),
            Arc::new(config),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn start__twice__runs_a_single_task() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        let dispatcher = dispatcher(messenger.clone(), spam_config(false));
        let spammer = dispatcher.spammer().clone();

        // when
        let first = spammer.start(dispatcher.clone(), CHAT).await;
        let second = spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(12)).await;

        // then
        assert!(first);
        assert!(!second);
        assert!(spammer.is_active().await);
        // one task throwing at t = 0, 5 and 10
        assert_eq!(messenger.throws_sent(), 3);
        let counts = dispatcher.history().counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.self_triggered, 3);
        spammer.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop__then_start__spams_again() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        let dispatcher = dispatcher(messenger.clone(), spam_config(false));
        let spammer = dispatcher.spammer().clone();
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        // when
        let stopped = spammer.stop().await;
        let inactive_after_stop = !spammer.is_active().await;
        let restarted = spammer.start(dispatcher.clone(), CHAT).await;

        // then
        assert!(stopped);
        assert!(inactive_after_stop);
        assert!(restarted);
        assert!(spammer.is_active().await);
        spammer.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop__nothing_running__is_a_no_op() {
        let spammer = SpamController::new(spam_config(false));

        assert!(!spammer.stop().await);
        assert!(!spammer.is_active().await);
    }

    #[tokio::test(start_paused = true)]
    async fn start__rate_limited__waits_out_the_cooldown() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        messenger.script_throws([ScriptedThrow::RateLimited, ScriptedThrow::Value(2)]);
        let dispatcher = dispatcher(messenger.clone(), spam_config(false));
        let spammer = dispatcher.spammer().clone();

        // when
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        let recorded_during_cooldown = dispatcher.history().counts().total;
        tokio::time::sleep(Duration::from_secs(31)).await;

        // then
        assert_eq!(recorded_during_cooldown, 0);
        let counts = dispatcher.history().counts();
        assert_eq!(counts.total, 1);
        assert_eq!(counts.occurrence_of(2).unwrap(), 1);
        spammer.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop__during_cooldown__ends_the_task_promptly() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        messenger.script_throws([ScriptedThrow::RateLimited]);
        let dispatcher = dispatcher(messenger.clone(), spam_config(false));
        let spammer = dispatcher.spammer().clone();
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        // when
        let stopped = spammer.stop().await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        // then
        assert!(stopped);
        assert_eq!(messenger.throws_sent(), 1);
        assert_eq!(dispatcher.history().counts().total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start__transport_failure__skips_the_round_and_keeps_going() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        messenger.script_throws([ScriptedThrow::Broken, ScriptedThrow::Value(3)]);
        let dispatcher = dispatcher(messenger.clone(), spam_config(false));
        let spammer = dispatcher.spammer().clone();

        // when
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(6)).await;

        // then
        assert!(spammer.is_active().await);
        assert_eq!(dispatcher.history().counts().occurrence_of(3).unwrap(), 1);
        spammer.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start__golden_jackpot_then_win__announces_and_stops() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        messenger.script_throws(
            [JACKPOT, 6, 6, 4, 5]
                .into_iter()
                .map(ScriptedThrow::Value),
        );
        let dispatcher = dispatcher(messenger.clone(), spam_config(true));
        let spammer = dispatcher.spammer().clone();

        // when
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        // then
        assert!(!spammer.is_active().await);
        assert_eq!(
            messenger.texts(),
            vec!["Fuck yeah! #gloriousFiveDeluxe #suckItSteffen".to_string()]
        );
        assert_eq!(messenger.throws_sent(), 5);
        // gold run throws are not slot machine results
        assert_eq!(dispatcher.history().counts().total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start__golden_jackpot_then_miss__keeps_spamming() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        messenger.script_throws([ScriptedThrow::Value(JACKPOT), ScriptedThrow::Value(1)]);
        let dispatcher = dispatcher(messenger.clone(), spam_config(true));
        let spammer = dispatcher.spammer().clone();

        // when
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(16)).await;

        // then
        assert!(spammer.is_active().await);
        assert_eq!(messenger.texts(), vec!["#sad #fuckBowling".to_string()]);
        assert!(dispatcher.history().counts().total >= 2);
        spammer.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start__golden_run_loses_a_throw__reports_defeat_and_keeps_spamming() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        messenger.script_throws([ScriptedThrow::Value(JACKPOT), ScriptedThrow::Broken]);
        let dispatcher = dispatcher(messenger.clone(), spam_config(true));
        let spammer = dispatcher.spammer().clone();

        // when
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(16)).await;

        // then
        assert!(spammer.is_active().await);
        assert_eq!(messenger.texts(), vec!["#sad #fuckBowling".to_string()]);
        // jackpot at 0, lost bowling at 5, defeat at 10, next slot throw at 15
        assert_eq!(messenger.throws_sent(), 3);
        assert_eq!(dispatcher.history().counts().total, 2);
        spammer.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop__between_gold_stages__ends_the_run_right_away() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        messenger.script_throws([ScriptedThrow::Value(JACKPOT), ScriptedThrow::Value(6)]);
        let dispatcher = dispatcher(messenger.clone(), spam_config(true));
        let spammer = dispatcher.spammer().clone();
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(7)).await;

        // when
        let stopped = spammer.stop().await;
        let texts_at_stop = messenger.texts();
        tokio::time::sleep(Duration::from_secs(60)).await;

        // then
        assert!(stopped);
        assert_eq!(texts_at_stop, vec!["I got bored".to_string()]);
        assert_eq!(messenger.texts(), texts_at_stop);
        assert_eq!(messenger.throws_sent(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start__jackpot_without_golden_mode__just_keeps_spamming() {
        // given
        let messenger = Arc::new(FakeMessenger::new());
        messenger.script_throws([ScriptedThrow::Value(JACKPOT)]);
        let dispatcher = dispatcher(messenger.clone(), spam_config(false));
        let spammer = dispatcher.spammer().clone();

        // when
        spammer.start(dispatcher.clone(), CHAT).await;
        tokio::time::sleep(Duration::from_secs(6)).await;

        // then
        assert!(messenger.texts().is_empty());
        assert_eq!(dispatcher.history().counts().total, 2);
        spammer.stop().await;
    }
}
