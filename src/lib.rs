pub mod app;

pub mod config;

pub mod history;

pub mod slots;

pub mod updates;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use app::init_tracing;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid slot machine outcome {0}, expected a value in 1..=64")]
    InvalidOutcome(u8),

    #[error("malformed history snapshot: {0}")]
    Format(String),

    #[error("rate limited by remote (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("user {user_id:?} is not allowed to do that")]
    Unauthorized { user_id: Option<i64> },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("history storage failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to render histogram: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Any remote-call fault other than throttling.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Api { .. })
    }
}
