use crate::slots::Symbol;
use std::{
    path::PathBuf,
    time::Duration,
};

pub const HISTORY_FILE_NAME: &str = "history.json";

/// Photo sent in reply to a celebrated triple, already uploaded to the remote.
pub const CELEBRATION_FILE_ID: &str =
    "AgACAgIAAxkBAAOaYaevigmUAzZZ_K5CLEL2j4Gs2FkAAhe1MRsINDlJ0YwxQwvAN1wBAAMCAAN4AAMiBA";

#[derive(Debug, Clone)]
pub struct Config {
    pub admin_user_id: Option<i64>,
    pub data_dir: PathBuf,
    pub spam: SpamConfig,
    pub celebrated_symbol: Symbol,
    pub celebration_file_id: String,
}

impl Config {
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE_NAME)
    }

    pub fn is_admin(&self, user_id: Option<i64>) -> bool {
        matches!((self.admin_user_id, user_id), (Some(admin), Some(user)) if admin == user)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_user_id: None,
            data_dir: PathBuf::from("data"),
            spam: SpamConfig::default(),
            celebrated_symbol: Symbol::Lemon,
            celebration_file_id: CELEBRATION_FILE_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpamConfig {
    /// Run the gold mini-game after a jackpot.
    pub golden_mode: bool,
    /// Pause between spam cycles and between gold run stages.
    pub pacing: Duration,
    pub rate_limit_cooldown: Duration,
    /// How long `stop` waits for the background task to wind down.
    pub stop_grace: Duration,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            golden_mode: false,
            pacing: Duration::from_secs(5),
            rate_limit_cooldown: Duration::from_secs(60),
            stop_grace: Duration::from_millis(200),
        }
    }
}
