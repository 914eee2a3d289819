use thiserror::Error;

/// Classification of a metadata-provider failure, derived from the typed
/// error payload at the response boundary (never from message text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The provider rejected the call because the key's daily allowance
    /// is spent. The only retryable kind (by rotating keys).
    QuotaExceeded,
    NotFound,
    Http,
    Network,
    Decode,
}

#[derive(Debug, Clone, Error)]
#[error("provider error ({kind:?}{}): {message}", status.map(|s| format!(", status={s}")).unwrap_or_default())]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, None, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Decode, None, message)
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind == ProviderErrorKind::QuotaExceeded
    }
}

/// Error taxonomy surfaced past the orchestration boundary. Raw provider
/// payloads never leak through; they are translated into one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// Every configured key is at or above its daily allowance. Not
    /// retryable within the session.
    #[error("all API keys have reached their daily quota; usage resets at the provider's day boundary")]
    QuotaExhausted,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Bad URL, unresolvable handle, malformed ID. No network call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Checked against the locally cached ID set before any network call.
    #[error("already saved: {0}")]
    Duplicate(String),

    #[error("save failed: {0}")]
    Persistence(String),

    /// Ledger or counter file could not be read/written.
    #[error("quota state storage: {0}")]
    Storage(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
