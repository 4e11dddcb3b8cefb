//! Message types: the native envelope, the generic in-process message and
//! the message shape handlers.

use crate::error::WmqError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Native message format constants
pub mod format {
    /// Character data (the string formats)
    pub const MQFMT_STRING: &str = "MQSTR   ";
    /// No defined format (the bytes format)
    pub const MQFMT_NONE: &str = "        ";
    /// Serialized object payloads
    pub const OBJECT: &str = "Object";
}

// ============================================================================
// NativeMessage
// ============================================================================

/// The middleware-native message envelope.
///
/// Owns a payload buffer plus the fixed descriptor field set. Instances are
/// created fresh per consume/produce attempt and live for a single queue
/// open/close cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeMessage {
    pub accounting_token: Vec<u8>,
    pub application_id_data: String,
    pub application_origin_data: String,
    pub backout_count: i32,
    pub character_set: i32,
    pub correlation_id: Vec<u8>,
    pub encoding: i32,
    pub expiry: i32,
    pub feedback: i32,
    pub format: String,
    pub group_id: Vec<u8>,
    pub message_flags: i32,
    pub message_id: Vec<u8>,
    pub message_sequence_number: i32,
    pub message_type: i32,
    pub offset: i32,
    pub original_length: i32,
    pub persistence: i32,
    pub priority: i32,
    pub put_application_name: String,
    pub put_application_type: i32,
    pub put_date_time: Option<DateTime<Utc>>,
    pub reply_to_queue_manager_name: String,
    pub reply_to_queue_name: String,
    pub report: i32,
    pub user_id: String,
    version: i32,
    payload: Bytes,
}

impl Default for NativeMessage {
    fn default() -> Self {
        Self {
            accounting_token: Vec::new(),
            application_id_data: String::new(),
            application_origin_data: String::new(),
            backout_count: 0,
            character_set: 0,
            correlation_id: Vec::new(),
            encoding: 0,
            expiry: -1,
            feedback: 0,
            format: format::MQFMT_NONE.to_string(),
            group_id: Vec::new(),
            message_flags: 0,
            message_id: Vec::new(),
            message_sequence_number: 1,
            message_type: 8,
            offset: 0,
            original_length: -1,
            persistence: 2,
            priority: -1,
            put_application_name: String::new(),
            put_application_type: 0,
            put_date_time: None,
            reply_to_queue_manager_name: String::new(),
            reply_to_queue_name: String::new(),
            report: 0,
            user_id: String::new(),
            version: 1,
            payload: Bytes::new(),
        }
    }
}

impl NativeMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Set the descriptor version. Only versions 1 and 2 exist.
    pub fn set_version(&mut self, version: i32) -> Result<(), WmqError> {
        if !(1..=2).contains(&version) {
            return Err(WmqError::FieldFormat {
                field: "version".to_string(),
                message: format!("{version} is not a valid descriptor version"),
            });
        }
        self.version = version;
        Ok(())
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: Bytes) {
        self.payload = payload;
    }
}

// ============================================================================
// GenericMessage
// ============================================================================

/// The generic in-process message: a payload, string metadata and a unique
/// identifier. Created per unit of work and discarded after dispatch or
/// produce completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericMessage {
    unique_id: String,
    payload: Bytes,
    metadata: HashMap<String, String>,
}

impl GenericMessage {
    /// Create an empty message with a fresh unique id
    pub fn new() -> Self {
        Self {
            unique_id: uuid::Uuid::new_v4().to_string(),
            payload: Bytes::new(),
            metadata: HashMap::new(),
        }
    }

    /// Set the payload buffer
    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn set_unique_id(&mut self, id: impl Into<String>) {
        self.unique_id = id.into();
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: Bytes) {
        self.payload = payload;
    }

    /// The payload as UTF-8 text
    pub fn payload_str(&self) -> Result<&str, WmqError> {
        std::str::from_utf8(&self.payload).map_err(|e| WmqError::Payload {
            message: format!("payload is not valid UTF-8: {e}"),
        })
    }

    pub fn contains_metadata(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}

impl Default for GenericMessage {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MessageFormat
// ============================================================================

/// Message shape handlers controlling how payloads cross the native
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageFormat {
    /// UTF-8 character data; payloads are validated on both directions
    Text,
    /// Character data in the message's character set; native payloads are
    /// converted lossily on read
    String,
    /// Raw bytes, copied verbatim
    Bytes,
    /// Serialized object payloads, copied verbatim
    Object,
}

impl MessageFormat {
    /// Look up a shape handler by name (case-insensitive). Unknown names
    /// fall back to [`MessageFormat::Text`] with a logged warning.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            "object" => Self::Object,
            _ => {
                warn!(name, "message format is not supported, defaulting to Text");
                Self::Text
            }
        }
    }

    /// Build a fresh native message with the format field seeded for this
    /// shape.
    pub fn create(&self) -> NativeMessage {
        let mut msg = NativeMessage::new();
        msg.format = match self {
            Self::Text | Self::String => format::MQFMT_STRING.to_string(),
            Self::Bytes => format::MQFMT_NONE.to_string(),
            Self::Object => format::OBJECT.to_string(),
        };
        msg
    }

    /// Write the generic payload into the native message.
    pub fn write_to_native(
        &self,
        msg: &GenericMessage,
        native: &mut NativeMessage,
    ) -> Result<(), WmqError> {
        match self {
            Self::Text => {
                // Strict UTF-8 for the Text shape
                let text = msg.payload_str()?;
                native.set_payload(Bytes::copy_from_slice(text.as_bytes()));
            }
            Self::String | Self::Bytes | Self::Object => {
                native.set_payload(msg.payload().clone());
            }
        }
        Ok(())
    }

    /// Write the native payload into the generic message.
    pub fn write_to_generic(
        &self,
        native: &NativeMessage,
        msg: &mut GenericMessage,
    ) -> Result<(), WmqError> {
        match self {
            Self::Text => {
                let text =
                    std::str::from_utf8(native.payload()).map_err(|e| WmqError::Payload {
                        message: format!("native payload is not valid UTF-8: {e}"),
                    })?;
                msg.set_payload(Bytes::copy_from_slice(text.as_bytes()));
            }
            Self::String => {
                let text = String::from_utf8_lossy(native.payload()).into_owned();
                msg.set_payload(Bytes::from(text));
            }
            Self::Bytes | Self::Object => {
                msg.set_payload(native.payload().clone());
            }
        }
        Ok(())
    }
}

impl Default for MessageFormat {
    fn default() -> Self {
        Self::Text
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
