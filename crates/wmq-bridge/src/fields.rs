//! The native field registry: typed getter/setter access to every
//! descriptor field on a [`NativeMessage`], looked up by the field's
//! documented descriptor name.

use crate::error::WmqError;
use crate::message::NativeMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The shared datetime format used by timestamp fields
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Format a timestamp with the shared datetime format.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format(DATE_FORMAT).to_string()
}

/// Parse a timestamp in the shared datetime format (RFC 3339 also accepted).
pub fn parse_datetime(field: &str, value: &str) -> Result<DateTime<Utc>, WmqError> {
    DateTime::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WmqError::FieldFormat {
            field: field.to_string(),
            message: format!("{value} is not a valid timestamp: {e}"),
        })
}

// ============================================================================
// ByteCodec
// ============================================================================

/// String↔bytes strategy for the binary descriptor fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteCodec {
    /// Standard base64 with padding
    Base64,
    /// Lower-case hex digits
    Hex,
    /// The raw UTF-8 bytes of the string
    Utf8,
}

impl ByteCodec {
    /// Convert a string value into the field's byte representation.
    pub fn to_bytes(&self, field: &str, value: &str) -> Result<Vec<u8>, WmqError> {
        use base64::{engine::general_purpose, Engine as _};
        match self {
            Self::Base64 => {
                general_purpose::STANDARD
                    .decode(value)
                    .map_err(|e| WmqError::Encoding {
                        field: field.to_string(),
                        message: format!("invalid base64: {e}"),
                    })
            }
            Self::Hex => hex::decode(value).map_err(|e| WmqError::Encoding {
                field: field.to_string(),
                message: format!("invalid hex: {e}"),
            }),
            Self::Utf8 => Ok(value.as_bytes().to_vec()),
        }
    }

    /// Convert a field's byte representation back into a string.
    pub fn to_string_value(&self, field: &str, bytes: &[u8]) -> Result<String, WmqError> {
        use base64::{engine::general_purpose, Engine as _};
        match self {
            Self::Base64 => Ok(general_purpose::STANDARD.encode(bytes)),
            Self::Hex => Ok(hex::encode(bytes)),
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| WmqError::Encoding {
                field: field.to_string(),
                message: format!("bytes are not valid UTF-8: {e}"),
            }),
        }
    }
}

// ============================================================================
// NativeField
// ============================================================================

/// Fields within a native message descriptor.
///
/// Each field carries a semantic type: string, integer, opaque binary or
/// timestamp. Binary fields require a [`ByteCodec`] on both get and set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeField {
    AccountingToken,
    ApplicationIdData,
    ApplicationOriginData,
    BackoutCount,
    CharacterSet,
    CorrelationId,
    Encoding,
    Expiry,
    Feedback,
    Format,
    GroupId,
    MessageFlags,
    MessageId,
    MessageSequenceNumber,
    MessageType,
    Offset,
    OriginalLength,
    Persistence,
    Priority,
    PutApplicationName,
    PutApplicationType,
    PutDateTime,
    ReplyToQueueManagerName,
    ReplyToQueueName,
    Report,
    UserId,
    Version,
}

impl NativeField {
    /// The field's descriptor name as documented by the native client.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountingToken => "accountingToken",
            Self::ApplicationIdData => "applicationIdData",
            Self::ApplicationOriginData => "applicationOriginData",
            Self::BackoutCount => "backoutCount",
            Self::CharacterSet => "characterSet",
            Self::CorrelationId => "correlationId",
            Self::Encoding => "encoding",
            Self::Expiry => "expiry",
            Self::Feedback => "feedback",
            Self::Format => "format",
            Self::GroupId => "groupId",
            Self::MessageFlags => "messageFlags",
            Self::MessageId => "messageId",
            Self::MessageSequenceNumber => "messageSequenceNumber",
            Self::MessageType => "messageType",
            Self::Offset => "offset",
            Self::OriginalLength => "originalLength",
            Self::Persistence => "persistence",
            Self::Priority => "priority",
            Self::PutApplicationName => "putApplicationName",
            Self::PutApplicationType => "putApplicationType",
            Self::PutDateTime => "putDateTime",
            Self::ReplyToQueueManagerName => "replyToQueueManagerName",
            Self::ReplyToQueueName => "replyToQueueName",
            Self::Report => "report",
            Self::UserId => "userId",
            Self::Version => "version",
        }
    }

    /// Whether this field holds opaque binary data.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Self::AccountingToken | Self::CorrelationId | Self::GroupId | Self::MessageId
        )
    }

    /// Map a string value onto the field.
    ///
    /// Integer and timestamp fields parse their input and fail with
    /// [`WmqError::FieldFormat`] on malformed values. Binary fields fail
    /// with [`WmqError::MissingByteCodec`] when no codec is given.
    pub fn set(
        &self,
        native: &mut NativeMessage,
        value: &str,
        codec: Option<&ByteCodec>,
    ) -> Result<(), WmqError> {
        match self {
            Self::AccountingToken => native.accounting_token = self.decode(value, codec)?,
            Self::ApplicationIdData => native.application_id_data = value.to_string(),
            Self::ApplicationOriginData => native.application_origin_data = value.to_string(),
            Self::BackoutCount => native.backout_count = self.parse_int(value)?,
            Self::CharacterSet => native.character_set = self.parse_int(value)?,
            Self::CorrelationId => native.correlation_id = self.decode(value, codec)?,
            Self::Encoding => native.encoding = self.parse_int(value)?,
            Self::Expiry => native.expiry = self.parse_int(value)?,
            Self::Feedback => native.feedback = self.parse_int(value)?,
            Self::Format => native.format = value.to_string(),
            Self::GroupId => native.group_id = self.decode(value, codec)?,
            Self::MessageFlags => native.message_flags = self.parse_int(value)?,
            Self::MessageId => native.message_id = self.decode(value, codec)?,
            Self::MessageSequenceNumber => {
                native.message_sequence_number = self.parse_int(value)?
            }
            Self::MessageType => native.message_type = self.parse_int(value)?,
            Self::Offset => native.offset = self.parse_int(value)?,
            Self::OriginalLength => native.original_length = self.parse_int(value)?,
            Self::Persistence => native.persistence = self.parse_int(value)?,
            Self::Priority => native.priority = self.parse_int(value)?,
            Self::PutApplicationName => native.put_application_name = value.to_string(),
            Self::PutApplicationType => native.put_application_type = self.parse_int(value)?,
            Self::PutDateTime => {
                native.put_date_time = Some(parse_datetime(self.name(), value)?)
            }
            Self::ReplyToQueueManagerName => {
                native.reply_to_queue_manager_name = value.to_string()
            }
            Self::ReplyToQueueName => native.reply_to_queue_name = value.to_string(),
            Self::Report => native.report = self.parse_int(value)?,
            Self::UserId => native.user_id = value.to_string(),
            Self::Version => {
                let version = self.parse_int(value)?;
                native.set_version(version)?;
            }
        }
        Ok(())
    }

    /// Get the field's value as a string. Inverse of [`NativeField::set`].
    pub fn get(
        &self,
        native: &NativeMessage,
        codec: Option<&ByteCodec>,
    ) -> Result<String, WmqError> {
        let value = match self {
            Self::AccountingToken => self.encode(&native.accounting_token, codec)?,
            Self::ApplicationIdData => native.application_id_data.clone(),
            Self::ApplicationOriginData => native.application_origin_data.clone(),
            Self::BackoutCount => native.backout_count.to_string(),
            Self::CharacterSet => native.character_set.to_string(),
            Self::CorrelationId => self.encode(&native.correlation_id, codec)?,
            Self::Encoding => native.encoding.to_string(),
            Self::Expiry => native.expiry.to_string(),
            Self::Feedback => native.feedback.to_string(),
            Self::Format => native.format.clone(),
            Self::GroupId => self.encode(&native.group_id, codec)?,
            Self::MessageFlags => native.message_flags.to_string(),
            Self::MessageId => self.encode(&native.message_id, codec)?,
            Self::MessageSequenceNumber => native.message_sequence_number.to_string(),
            Self::MessageType => native.message_type.to_string(),
            Self::Offset => native.offset.to_string(),
            Self::OriginalLength => native.original_length.to_string(),
            Self::Persistence => native.persistence.to_string(),
            Self::Priority => native.priority.to_string(),
            Self::PutApplicationName => native.put_application_name.clone(),
            Self::PutApplicationType => native.put_application_type.to_string(),
            Self::PutDateTime => match native.put_date_time {
                Some(dt) => format_datetime(dt),
                None => {
                    return Err(WmqError::FieldFormat {
                        field: self.name().to_string(),
                        message: "field is not set".to_string(),
                    })
                }
            },
            Self::ReplyToQueueManagerName => native.reply_to_queue_manager_name.clone(),
            Self::ReplyToQueueName => native.reply_to_queue_name.clone(),
            Self::Report => native.report.to_string(),
            Self::UserId => native.user_id.clone(),
            Self::Version => native.version().to_string(),
        };
        Ok(value)
    }

    fn parse_int(&self, value: &str) -> Result<i32, WmqError> {
        value.parse::<i32>().map_err(|e| WmqError::FieldFormat {
            field: self.name().to_string(),
            message: format!("{value} is not a valid integer: {e}"),
        })
    }

    fn decode(&self, value: &str, codec: Option<&ByteCodec>) -> Result<Vec<u8>, WmqError> {
        let codec = codec.ok_or_else(|| WmqError::MissingByteCodec {
            field: self.name().to_string(),
        })?;
        codec.to_bytes(self.name(), value)
    }

    fn encode(&self, bytes: &[u8], codec: Option<&ByteCodec>) -> Result<String, WmqError> {
        let codec = codec.ok_or_else(|| WmqError::MissingByteCodec {
            field: self.name().to_string(),
        })?;
        codec.to_string_value(self.name(), bytes)
    }

    /// Every supported field, in descriptor order.
    pub fn all() -> &'static [NativeField] {
        &[
            Self::AccountingToken,
            Self::ApplicationIdData,
            Self::ApplicationOriginData,
            Self::BackoutCount,
            Self::CharacterSet,
            Self::CorrelationId,
            Self::Encoding,
            Self::Expiry,
            Self::Feedback,
            Self::Format,
            Self::GroupId,
            Self::MessageFlags,
            Self::MessageId,
            Self::MessageSequenceNumber,
            Self::MessageType,
            Self::Offset,
            Self::OriginalLength,
            Self::Persistence,
            Self::Priority,
            Self::PutApplicationName,
            Self::PutApplicationType,
            Self::PutDateTime,
            Self::ReplyToQueueManagerName,
            Self::ReplyToQueueName,
            Self::Report,
            Self::UserId,
            Self::Version,
        ]
    }
}

impl FromStr for NativeField {
    type Err = WmqError;

    /// Case-sensitive lookup by descriptor name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NativeField::all()
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| WmqError::UnsupportedField {
                field: s.to_string(),
            })
    }
}

impl std::fmt::Display for NativeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
