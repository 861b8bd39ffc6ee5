use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("could not reach backend")]
    Network(#[from] reqwest::Error),

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("backend rejected command sent to {endpoint} with status {status}: {body}")]
    CommandRejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("invalid backend endpoint {0:?}")]
    InvalidEndpoint(String),
}

/// Coarse classification shown on the operator's connection indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    MalformedResponse,
    CommandRejected,
}

impl BackendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Network(_) | BackendError::InvalidEndpoint(_) => ErrorKind::Network,
            BackendError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            BackendError::CommandRejected { .. } => ErrorKind::CommandRejected,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::Network => "network error",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::CommandRejected => "command rejected",
        })
    }
}
