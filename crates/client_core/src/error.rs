use shared::error::ApiException;
use thiserror::Error;

/// Failure of a single Document Service call.
///
/// The workflow controller collapses every variant into one generic status
/// notice per operation; the variants only exist for logs and callers that
/// want to report more detail.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid document service url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("could not encode '{filename}' for upload: {source}")]
    Form {
        filename: String,
        source: reqwest::Error,
    },
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        source: reqwest::Error,
    },
    #[error("{endpoint} returned status {status}: {source}")]
    Status {
        endpoint: &'static str,
        status: u16,
        source: ApiException,
    },
    #[error("{endpoint} returned an unreadable body: {source}")]
    Decode {
        endpoint: &'static str,
        source: reqwest::Error,
    },
    #[error("document service is unavailable")]
    Unavailable,
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Unavailable)
    }
}
