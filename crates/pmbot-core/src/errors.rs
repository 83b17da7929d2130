/// How a transport (chat delivery) failure should be handled downstream.
///
/// Assigned by the transport adapter from its library's typed errors, so the
/// error sink never has to match on human-readable description strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The recipient blocked the bot; replying would fail too.
    Blocked,
    /// The chat backend cannot be reached; replying is not possible.
    Unreachable,
    /// Anything else. A generic reply is still worth attempting.
    Other,
}

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the bot core
/// can handle failures consistently (log-only vs user-facing reply).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("supervisor error: {0}")]
    Supervisor(String),

    #[error("transport error: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Transport classification, if this is a transport failure.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Error::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
