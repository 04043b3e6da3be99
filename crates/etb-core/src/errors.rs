/// Core error type for the expense bot.
///
/// Adapter crates map their specific errors into this type so the dispatcher
/// can tell a storage outage (reported to the user) from a startup failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn storage(reason: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable(reason.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
