//! Option specifications and their resolution to broker bitmasks.
//!
//! Queue access and message get/put behavior is controlled by integer
//! bitmasks on the native client API. A specification is either the literal
//! integer, or a comma-separated list of the symbolic option names copied
//! from the client API documentation (e.g. `MQOO_INPUT_AS_Q_DEF,MQOO_OUTPUT`).

use crate::error::WmqError;
use crate::message::MessageFormat;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Context flags consulted by the produce path when compensating for the
/// broker's context-authority rules.
pub mod flags {
    pub const MQOO_SET_IDENTITY_CONTEXT: i32 = 0x0400;
    pub const MQOO_SET_ALL_CONTEXT: i32 = 0x0800;
    pub const MQPMO_SET_IDENTITY_CONTEXT: i32 = 0x0400;
    pub const MQPMO_SET_ALL_CONTEXT: i32 = 0x0800;
}

/// Resolve a symbolic option token to its integer bit value.
///
/// Token names are case-sensitive and match the native client constants
/// exactly. The table covers the queue-open (`MQOO_*`), queue-close
/// (`MQCO_*`), get (`MQGMO_*`) and put (`MQPMO_*`) families.
pub fn token_value(token: &str) -> Option<i32> {
    let value = match token {
        // Queue open options
        "MQOO_INPUT_AS_Q_DEF" => 0x0001,
        "MQOO_INPUT_SHARED" => 0x0002,
        "MQOO_INPUT_EXCLUSIVE" => 0x0004,
        "MQOO_BROWSE" => 0x0008,
        "MQOO_OUTPUT" => 0x0010,
        "MQOO_INQUIRE" => 0x0020,
        "MQOO_SET" => 0x0040,
        "MQOO_SAVE_ALL_CONTEXT" => 0x0080,
        "MQOO_PASS_IDENTITY_CONTEXT" => 0x0100,
        "MQOO_PASS_ALL_CONTEXT" => 0x0200,
        "MQOO_SET_IDENTITY_CONTEXT" => 0x0400,
        "MQOO_SET_ALL_CONTEXT" => 0x0800,
        "MQOO_ALTERNATE_USER_AUTHORITY" => 0x1000,
        "MQOO_FAIL_IF_QUIESCING" => 0x2000,

        // Queue close options
        "MQCO_NONE" => 0x0000,
        "MQCO_DELETE" => 0x0001,
        "MQCO_DELETE_PURGE" => 0x0002,

        // Get message options
        "MQGMO_NO_WAIT" => 0x0000,
        "MQGMO_WAIT" => 0x0001,
        "MQGMO_SYNCPOINT" => 0x0002,
        "MQGMO_NO_SYNCPOINT" => 0x0004,
        "MQGMO_BROWSE_FIRST" => 0x0010,
        "MQGMO_BROWSE_NEXT" => 0x0020,
        "MQGMO_ACCEPT_TRUNCATED_MSG" => 0x0040,
        "MQGMO_MSG_UNDER_CURSOR" => 0x0100,
        "MQGMO_LOCK" => 0x0200,
        "MQGMO_UNLOCK" => 0x0400,
        "MQGMO_BROWSE_MSG_UNDER_CURSOR" => 0x0800,
        "MQGMO_FAIL_IF_QUIESCING" => 0x2000,
        "MQGMO_CONVERT" => 0x4000,

        // Put message options
        "MQPMO_SYNCPOINT" => 0x0002,
        "MQPMO_NO_SYNCPOINT" => 0x0004,
        "MQPMO_DEFAULT_CONTEXT" => 0x0020,
        "MQPMO_NEW_MSG_ID" => 0x0040,
        "MQPMO_NEW_CORREL_ID" => 0x0080,
        "MQPMO_PASS_IDENTITY_CONTEXT" => 0x0100,
        "MQPMO_PASS_ALL_CONTEXT" => 0x0200,
        "MQPMO_SET_IDENTITY_CONTEXT" => 0x0400,
        "MQPMO_SET_ALL_CONTEXT" => 0x0800,
        "MQPMO_ALTERNATE_USER_AUTHORITY" => 0x1000,
        "MQPMO_FAIL_IF_QUIESCING" => 0x2000,
        "MQPMO_NO_CONTEXT" => 0x4000,
        "MQPMO_LOGICAL_ORDER" => 0x8000,
        "MQPMO_RESOLVE_LOCAL_Q" => 0x40000,

        _ => return None,
    };
    Some(value)
}

/// Resolve an option specification into its integer bitmask.
///
/// A specification that parses as an integer is returned verbatim; numeric
/// literals are an escape hatch and are never validated against the token
/// table. Otherwise each non-empty comma-separated token is resolved and the
/// values are ORed together.
pub fn resolve(spec: &str) -> Result<i32, WmqError> {
    if let Ok(value) = spec.parse::<i32>() {
        return Ok(value);
    }
    let mut result = 0;
    for token in spec.split(',').filter(|t| !t.is_empty()) {
        trace!(token, "resolving option token");
        let value = token_value(token).ok_or_else(|| WmqError::UnknownOptionToken {
            token: token.to_string(),
        })?;
        result |= value;
    }
    trace!(spec, resolved = result, "resolved option specification");
    Ok(result)
}

/// Append a symbolic token to an option specification.
///
/// A numeric specification has the token's bit value ORed in and is returned
/// as the new integer string. A textual specification gains `,token` unless
/// the token is already present as an exact element of the list, in which
/// case the specification is returned unchanged. Either way
/// `resolve(append(spec, token)) == resolve(spec) | token_value(token)`.
pub fn append(spec: &str, token: &str) -> Result<String, WmqError> {
    match spec.parse::<i32>() {
        Ok(numeric) => {
            let value = token_value(token).ok_or_else(|| WmqError::UnknownOptionToken {
                token: token.to_string(),
            })?;
            Ok((numeric | value).to_string())
        }
        Err(_) => {
            if spec.split(',').any(|t| t == token) {
                return Ok(spec.to_string());
            }
            Ok(format!("{spec},{token}"))
        }
    }
}

/// Options handling queue access and message options when getting or putting
/// messages on a queue.
///
/// The same `message_options` specification serves both directions: the
/// consume path reads it as get (`MQGMO_*`) options, the produce path as put
/// (`MQPMO_*`) options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageOptions {
    /// Open options applied when accessing the queue
    pub queue_open_options: String,
    /// Close options applied when the queue handle is released
    pub queue_close_options: String,
    /// Options that control the action of get and put
    pub message_options: String,
    /// The shape handler used to build native messages
    pub message_format: MessageFormat,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            queue_open_options: "MQOO_INPUT_AS_Q_DEF,MQOO_OUTPUT,MQOO_BROWSE".to_string(),
            queue_close_options: "MQCO_NONE".to_string(),
            message_options: "MQPMO_NO_SYNCPOINT".to_string(),
            message_format: MessageFormat::Text,
        }
    }
}

impl MessageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue open option specification
    pub fn with_queue_open_options(mut self, spec: impl Into<String>) -> Self {
        self.queue_open_options = spec.into();
        self
    }

    /// Replace the queue close option specification
    pub fn with_queue_close_options(mut self, spec: impl Into<String>) -> Self {
        self.queue_close_options = spec.into();
        self
    }

    /// Replace the get/put option specification
    pub fn with_message_options(mut self, spec: impl Into<String>) -> Self {
        self.message_options = spec.into();
        self
    }

    /// Replace the message shape handler
    pub fn with_message_format(mut self, format: MessageFormat) -> Self {
        self.message_format = format;
        self
    }

    /// Calculate the integer value of the queue open options.
    pub fn queue_open_options_value(&self) -> Result<i32, WmqError> {
        trace!(spec = %self.queue_open_options, "converting queue open options");
        resolve(&self.queue_open_options)
    }

    /// Calculate the integer value of the queue close options.
    pub fn queue_close_options_value(&self) -> Result<i32, WmqError> {
        trace!(spec = %self.queue_close_options, "converting queue close options");
        resolve(&self.queue_close_options)
    }

    /// Calculate the integer value of the get/put options.
    pub fn message_options_value(&self) -> Result<i32, WmqError> {
        trace!(spec = %self.message_options, "converting message options");
        resolve(&self.message_options)
    }

    /// Add a symbolic option to the queue open options.
    pub fn add_queue_open_option(&mut self, token: &str) -> Result<(), WmqError> {
        self.queue_open_options = append(&self.queue_open_options, token)?;
        Ok(())
    }

    /// Add a symbolic option to the queue close options.
    pub fn add_queue_close_option(&mut self, token: &str) -> Result<(), WmqError> {
        self.queue_close_options = append(&self.queue_close_options, token)?;
        Ok(())
    }

    /// Add a symbolic option to the get/put options.
    pub fn add_message_option(&mut self, token: &str) -> Result<(), WmqError> {
        self.message_options = append(&self.message_options, token)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
