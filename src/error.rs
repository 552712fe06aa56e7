use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map a non-success HTTP status to the matching error class
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Error::Unauthorized(message),
            403 => Error::Forbidden(message),
            404 => Error::NotFound(message),
            _ => Error::Server { status, message },
        }
    }

    /// True for session and role failures (401/403)
    pub fn is_authorization(&self) -> bool {
        matches!(self, Error::Unauthorized(_) | Error::Forbidden(_))
    }

    /// True for failures worth retrying later (server side or transport)
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Server { .. } | Error::Network(_))
    }

    /// Guidance text shown next to the error in the console
    pub fn guidance(&self) -> &'static str {
        match self {
            Error::Unauthorized(_) | Error::Forbidden(_) => {
                "Sign in with a viewer, operator or admin account and try again."
            }
            Error::NotFound(_) => "The item is no longer available. Try downloading it from Export.",
            Error::Server { .. } | Error::Network(_) => {
                "The service could not be reached. Close and reopen to retry."
            }
            _ => "An unexpected error occurred.",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Error::Serialization(err.to_string());
        }
        match err.status() {
            Some(status) => Error::from_status(status.as_u16(), err.to_string()),
            None => Error::Network(err.to_string()),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}
