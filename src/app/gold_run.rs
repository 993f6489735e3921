//! The gold run: a four-stage mini-game played after a jackpot.
//!
//! Every stage throws once and must hit its target to unlock the next one:
//! bowling (strike), dart (bullseye), football (goal), basketball (basket).
//! The run ends at the first miss, at the first failed throw, or as soon as
//! the run is cancelled.
use crate::{
    Result,
    app::pause,
    updates::{
        Message,
        ThrowKind,
    },
};
use std::{
    fmt,
    time::Duration,
};
use tokio_util::sync::CancellationToken;

/// Something that can produce a remote throw on demand.
pub trait ThrowSource {
    /// `Ok(None)` when the caller gave up, e.g. because spam mode was stopped.
    fn throw(&self, kind: ThrowKind) -> impl Future<Output = Result<Option<Message>>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoldStage {
    Bowling,
    Dart,
    Football,
    Basketball,
    Won,
}

impl GoldStage {
    pub fn throw_kind(self) -> Option<ThrowKind> {
        match self {
            GoldStage::Bowling => Some(ThrowKind::Bowling),
            GoldStage::Dart => Some(ThrowKind::Dart),
            GoldStage::Football => Some(ThrowKind::Football),
            GoldStage::Basketball => Some(ThrowKind::Basketball),
            GoldStage::Won => None,
        }
    }

    pub fn is_hit(self, value: u8) -> bool {
        match self {
            GoldStage::Bowling | GoldStage::Dart => value == 6,
            GoldStage::Football => (3..=5).contains(&value),
            GoldStage::Basketball => (4..=5).contains(&value),
            GoldStage::Won => false,
        }
    }

    pub fn next(self) -> GoldStage {
        match self {
            GoldStage::Bowling => GoldStage::Dart,
            GoldStage::Dart => GoldStage::Football,
            GoldStage::Football => GoldStage::Basketball,
            GoldStage::Basketball | GoldStage::Won => GoldStage::Won,
        }
    }
}

impl fmt::Display for GoldStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.throw_kind() {
            Some(kind) => fmt::Display::fmt(&kind, f),
            None => f.write_str("won"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoldRunResult {
    /// Stage the run ended at, `Won` if every stage was hit.
    pub stage: GoldStage,
    /// Last throw of the run, `None` if the final throw never happened.
    pub last_message_id: Option<i64>,
    /// The run was cancelled before it could finish.
    pub abandoned: bool,
}

impl GoldRunResult {
    pub fn is_won(&self) -> bool {
        self.stage == GoldStage::Won
    }
}

/// Play the gold run, pausing `pacing` between stages until `token` is cancelled.
pub async fn try_for_gold<T: ThrowSource>(
    throws: &T,
    pacing: Duration,
    token: &CancellationToken,
) -> GoldRunResult {
    let mut stage = GoldStage::Bowling;
    let mut last_message_id = None;
    while let Some(kind) = stage.throw_kind() {
        let message = match throws.throw(kind).await {
            Ok(Some(message)) => message,
            Ok(None) => return abandoned(stage),
            Err(e) => {
                tracing::warn!("Gold run lost its {stage} throw: {e}");
                return GoldRunResult {
                    stage,
                    last_message_id: None,
                    abandoned: false,
                };
            }
        };
        let value = message.throw().map(|throw| throw.value);
        if !value.is_some_and(|value| stage.is_hit(value)) {
            if matches!(stage, GoldStage::Football | GoldStage::Basketball) {
                tracing::warn!("Failed {stage} with value {value:?}");
            }
            return GoldRunResult {
                stage,
                last_message_id: Some(message.message_id),
                abandoned: false,
            };
        }
        last_message_id = Some(message.message_id);
        stage = stage.next();
        if stage != GoldStage::Won && !pause(token, pacing).await {
            return abandoned(stage);
        }
    }
    GoldRunResult {
        stage,
        last_message_id,
        abandoned: false,
    }
}

fn abandoned(stage: GoldStage) -> GoldRunResult {
    tracing::info!("Gold run abandoned at {stage}");
    GoldRunResult {
        stage,
        last_message_id: None,
        abandoned: true,
    }
}
