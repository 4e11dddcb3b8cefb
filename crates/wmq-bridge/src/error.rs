//! Error types for bridge operations.

use thiserror::Error;

/// Comprehensive error type for all bridge operations
#[derive(Debug, Error)]
pub enum WmqError {
    #[error("Unknown option token: {token}")]
    UnknownOptionToken { token: String },

    #[error("{field} is not a supported native message field")]
    UnsupportedField { field: String },

    #[error("Invalid value for field {field}: {message}")]
    FieldFormat { field: String, message: String },

    #[error("{field} is a binary field, no byte codec configured")]
    MissingByteCodec { field: String },

    #[error("Byte codec failed for field {field}: {message}")]
    Encoding { field: String, message: String },

    #[error("{mapper} may not be used to copy native fields {direction}")]
    UnsupportedMapping {
        mapper: String,
        direction: MappingDirection,
    },

    #[error("Payload extraction failed for [{expression}]: {message}")]
    Extraction { expression: String, message: String },

    #[error("Payload error: {message}")]
    Payload { message: String },

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("Failed to produce to queue {queue}")]
    Produce {
        queue: String,
        #[source]
        source: Box<WmqError>,
    },

    #[error("Native error handler failed")]
    Handler {
        #[source]
        source: Box<WmqError>,
    },
}

impl WmqError {
    /// Check whether this error is the benign no-message-available signal.
    pub fn is_no_message(&self) -> bool {
        matches!(self, Self::Broker(e) if e.is_no_message())
    }

    /// Check whether this error indicates a broken broker connection.
    ///
    /// Produce failures are inspected through the wrapper so callers can
    /// classify the underlying broker outcome.
    pub fn is_connection_broken(&self) -> bool {
        match self {
            Self::Broker(e) => e.is_connection_broken(),
            Self::Produce { source, .. } => source.is_connection_broken(),
            _ => false,
        }
    }
}

/// A reason-coded error raised at the native middleware boundary
#[derive(Debug, Clone, Error)]
#[error("Broker error (completion code {completion_code}, reason {reason_code}): {message}")]
pub struct BrokerError {
    completion_code: i32,
    reason_code: i32,
    message: String,
}

impl BrokerError {
    pub fn new(completion_code: i32, reason_code: i32, message: impl Into<String>) -> Self {
        Self {
            completion_code,
            reason_code,
            message: message.into(),
        }
    }

    /// Shorthand for a failed completion with the given reason code.
    pub fn failed(reason_code: i32, message: impl Into<String>) -> Self {
        Self::new(crate::broker::completion::MQCC_FAILED, reason_code, message)
    }

    pub fn completion_code(&self) -> i32 {
        self.completion_code
    }

    pub fn reason_code(&self) -> i32 {
        self.reason_code
    }

    /// The broker reports no message on the queue. Loop-termination signal,
    /// not a failure.
    pub fn is_no_message(&self) -> bool {
        self.reason_code == crate::broker::reason::MQRC_NO_MSG_AVAILABLE
    }

    pub fn is_connection_broken(&self) -> bool {
        self.reason_code == crate::broker::reason::MQRC_CONNECTION_BROKEN
    }
}

/// Direction of a field-mapper copy, used in mapping errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingDirection {
    /// Generic message into native message
    ToNative,
    /// Native message into generic message
    FromNative,
}

impl std::fmt::Display for MappingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToNative => write!(f, "to the native message"),
            Self::FromNative => write!(f, "from the native message"),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
