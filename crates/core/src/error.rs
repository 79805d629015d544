use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// The server answered with a structured `error` field.
    #[error("{0}")]
    Server(String),

    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("realtime channel error: {0}")]
    Channel(String),

    #[error("realtime channel closed")]
    ChannelClosed,
}

impl ClientError {
    /// Transport-level failures are the only ones worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Timeout(_) => true,
            ClientError::Http(error) => error.is_connect() || error.is_timeout(),
            ClientError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Channel(error.to_string())
    }
}
