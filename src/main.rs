use anyhow::Context;
use clap::{
    Parser,
    Subcommand,
};
use slot_bot::{
    app::{
        App,
        RunState,
        dispatcher::UpdateDispatcher,
        file_history_storage::FileHistoryStorage,
        history_storage::HistoryStorage,
        summary::Summary,
        telegram::TelegramClient,
    },
    config::{
        Config,
        SpamConfig,
    },
    history::History,
    init_tracing,
    slots::Symbol,
};
use std::{
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

const DEFAULT_DATA_PATH: &str = "data";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Bot token, required for `run`.
    #[arg(long, env = "TELEGRAM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "ADMIN_USER_ID")]
    admin_user_id: Option<i64>,

    /// Directory holding the persisted history.
    #[arg(long, env = "DATA_PATH")]
    data_path: Option<PathBuf>,

    /// Go for gold after hitting the jackpot while spamming.
    #[arg(long, env = "TRY_GOLDEN_FIVE")]
    try_golden_five: bool,

    /// Seconds between spam throws.
    #[arg(long, env = "SLEEP_TIME", default_value_t = 5)]
    sleep_time: u64,

    /// Seconds to back off after being rate limited.
    #[arg(long, env = "RATE_LIMIT_COOLDOWN", default_value_t = 60)]
    rate_limit_cooldown: u64,

    #[arg(long, env = "CELEBRATED_SYMBOL", default_value = "LEMON")]
    celebrated_symbol: Symbol,

    #[arg(long, env = "LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Poll for updates and answer them (default).
    Run,
    /// Print the summary of the persisted history and exit.
    Summary,
}

impl Args {
    fn config(&self) -> Config {
        let data_dir = match &self.data_path {
            Some(path) => path.clone(),
            None => {
                tracing::warn!(
                    "DATA_PATH not set, keeping history in ./{DEFAULT_DATA_PATH}"
                );
                PathBuf::from(DEFAULT_DATA_PATH)
            }
        };
        Config {
            admin_user_id: self.admin_user_id,
            data_dir,
            spam: SpamConfig {
                golden_mode: self.try_golden_five,
                pacing: Duration::from_secs(self.sleep_time),
                rate_limit_cooldown: Duration::from_secs(self.rate_limit_cooldown),
                ..SpamConfig::default()
            },
            celebrated_symbol: self.celebrated_symbol,
            ..Config::default()
        }
    }
}

async fn handle_interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(_) => {
            tracing::info!("Received interrupt, exiting");
        }
        Err(_) => {
            tracing::warn!("Received interrupt error, exiting anyway");
        }
    }
}

fn load_history(storage: &FileHistoryStorage) -> anyhow::Result<History> {
    let history = storage
        .load()
        .with_context(|| format!("loading history from {}", storage.path().display()))?;
    Ok(match history {
        Some(history) => {
            tracing::info!(
                "Loaded {} recorded results from {}",
                history.counts().total,
                storage.path().display()
            );
            history
        }
        None => {
            tracing::info!(
                "No history at {}, starting from scratch",
                storage.path().display()
            );
            History::new()
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref());
    let config = args.config();
    let storage = FileHistoryStorage::open(config.history_path())
        .context("opening history storage")?;
    let history = load_history(&storage)?;

    if args.command == Some(Command::Summary) {
        println!("{}", Summary::collect(&history.counts()));
        return Ok(());
    }

    let api_key = args
        .api_key
        .as_deref()
        .context("TELEGRAM_API_KEY (or --api-key) is required to run the bot")?;
    if config.admin_user_id.is_none() {
        tracing::warn!("ADMIN_USER_ID not set, nobody can control spam mode");
    }
    let client = TelegramClient::new(api_key).context("building telegram client")?;
    let dispatcher = UpdateDispatcher::new(
        Arc::new(client.clone()),
        Arc::new(history),
        Arc::new(storage),
        Arc::new(config),
    );
    let mut app = App::new(client, dispatcher);

    tracing::info!("Starting slot bot");
    loop {
        let interrupt = handle_interrupt();
        match app.run(interrupt).await {
            RunState::Continue => continue,
            RunState::Exit => {
                tracing::info!("Exiting slot bot");
                return Ok(());
            }
        }
    }
}
