//! Error types for Trellis

use http::StatusCode;

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Trellis
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No route, controller, or action matched the request
    #[error("{0}")]
    Routing(String),

    /// A route matched the path but not the request method
    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Requested method
        method: String,
        /// Requested path
        path: String,
    },

    /// A path parameter contained a malformed percent-escape
    #[error("Failed to decode param '{value}'")]
    MalformedParameter {
        /// Raw, undecoded parameter value
        value: String,
    },

    /// A middleware invoked its continuation more than once or out of order
    #[error("next() called multiple times (position {index})")]
    ReentrantContinuation {
        /// Chain position whose continuation was re-entered
        index: usize,
    },

    /// Error raised by application code carrying its own HTTP status
    #[error("{message}")]
    Status {
        /// HTTP status to respond with
        status: StatusCode,
        /// Error message
        message: String,
        /// Whether `message` may be sent to the client
        expose: bool,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    HttpError(#[from] http::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert error to HTTP status code
    pub fn to_status_code(&self) -> StatusCode {
        match self {
            Error::Routing(_) => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::MalformedParameter { .. } => StatusCode::BAD_REQUEST,
            Error::Status { status, .. } => *status,
            Error::Io(err) if err.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the raw message may be shown to the client.
    ///
    /// Only errors raised explicitly with a status expose their message;
    /// everything else is answered with the canonical status text.
    pub fn expose(&self) -> bool {
        matches!(self, Error::Status { expose: true, .. })
    }

    /// Message suitable for the response body
    pub fn public_message(&self) -> String {
        if self.expose() {
            return self.to_string();
        }
        let status = self.to_status_code();
        status
            .canonical_reason()
            .unwrap_or_else(|| status.as_str())
            .to_string()
    }

    /// A protocol violation that must abort the chain
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ReentrantContinuation { .. })
    }

    /// Create an error carrying an explicit status.
    ///
    /// Client errors (4xx) expose their message, server errors do not.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Error::Status {
            status,
            message: message.into(),
            expose: status.is_client_error(),
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(StatusCode::NOT_FOUND, message)
    }

    /// Create a routing error
    pub fn routing(message: impl Into<String>) -> Self {
        Error::Routing(message.into())
    }
}
