use thiserror::Error;
use tickburst::{Classification, Classify, ScheduleError};

/// Failure of a single remote call. Always data, never fatal.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote rejected the call with {code} ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Remote returned status {status} without an error code")]
    Unclassified { status: u16 },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Classify for RemoteError {
    fn classify(&self) -> Classification {
        match self {
            RemoteError::Api { code, .. } => Classification::from_code(Some(code)),
            RemoteError::Unclassified { .. } | RemoteError::Transport(_) => {
                Classification::from_code(None)
            }
        }
    }
}

/// Failures before the first tick. These abort the run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid endpoint `{endpoint}`: {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unable to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Unable to reach {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("No rate entered for stream `{0}`")]
    MissingRate(String),

    #[error("Unable to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
