use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Raised for internal errors in the relay.  Should not happen.
    #[error("internal error: {message:?}")]
    Internal { message: String },

    #[error("invalid DNA character in input k-mer: {message}")]
    InvalidDNA { message: String },

    #[error("Invalid hash function: {function:?}")]
    InvalidHashFunction { function: String },

    #[error("could not read sequences from {name:?}: {message}")]
    InvalidSequence { name: String, message: String },

    #[error("invalid signature: {message}")]
    InvalidSignature { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("missing form field {field:?}")]
    MissingField { field: String },

    #[error("malformed upload: {message}")]
    Upload { message: String },

    /// The remote search could not be reached or refused the query.
    #[error("search request failed: {message}")]
    Upstream { message: String },

    #[error("malformed search results: {0}")]
    MalformedResults(#[from] csv::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::error::Error),

    #[error(transparent)]
    NifflerError(#[from] niffler::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Upstream {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for RelayError {
    fn from(err: tokio::task::JoinError) -> Self {
        RelayError::Internal {
            message: err.to_string(),
        }
    }
}

impl RelayError {
    /// Errors caused by the caller's input, as opposed to the relay or the
    /// remote search.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidDNA { .. }
                | RelayError::InvalidHashFunction { .. }
                | RelayError::InvalidSequence { .. }
                | RelayError::InvalidSignature { .. }
                | RelayError::InvalidRequest { .. }
                | RelayError::MissingField { .. }
                | RelayError::Upload { .. }
        )
    }
}
