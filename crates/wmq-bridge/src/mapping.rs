//! Field mappers: produce or consume a single native descriptor field per
//! message exchange.
//!
//! A mapper binds a descriptor field name to a value source. Some sources
//! are one-way: generated identifiers and extracted-expression values can be
//! written to a native message but never read back.

use crate::error::{MappingDirection, WmqError};
use crate::fields::{ByteCodec, NativeField};
use crate::message::{GenericMessage, NativeMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, trace};

/// A configured binding between a native descriptor field and a value
/// source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldMapper {
    /// A statically configured value
    ConfiguredField {
        field_name: String,
        value: Option<String>,
        #[serde(default)]
        byte_codec: Option<ByteCodec>,
        #[serde(default)]
        convert_null: bool,
    },
    /// A generic-message metadata value, copied in either direction
    MetadataField {
        field_name: String,
        metadata_key: String,
        #[serde(default)]
        byte_codec: Option<ByteCodec>,
    },
    /// A freshly generated unique identifier per call; write-only
    GeneratedIdField {
        field_name: String,
        #[serde(default)]
        byte_codec: Option<ByteCodec>,
    },
    /// A value extracted from the generic message's JSON payload; write-only
    JsonPathField {
        field_name: String,
        path: String,
        #[serde(default)]
        byte_codec: Option<ByteCodec>,
        #[serde(default)]
        convert_null: bool,
    },
    /// The generic message's own unique identifier, copied in either
    /// direction
    MessageIdField {
        field_name: String,
        #[serde(default)]
        byte_codec: Option<ByteCodec>,
    },
}

impl FieldMapper {
    pub fn configured(field_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ConfiguredField {
            field_name: field_name.into(),
            value: Some(value.into()),
            byte_codec: None,
            convert_null: false,
        }
    }

    pub fn metadata(field_name: impl Into<String>, metadata_key: impl Into<String>) -> Self {
        Self::MetadataField {
            field_name: field_name.into(),
            metadata_key: metadata_key.into(),
            byte_codec: None,
        }
    }

    pub fn generated_id(field_name: impl Into<String>) -> Self {
        Self::GeneratedIdField {
            field_name: field_name.into(),
            byte_codec: None,
        }
    }

    pub fn json_path(field_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::JsonPathField {
            field_name: field_name.into(),
            path: path.into(),
            byte_codec: None,
            convert_null: false,
        }
    }

    /// An identifier-copy mapper against the default `messageId` field.
    pub fn message_id() -> Self {
        Self::MessageIdField {
            field_name: "messageId".to_string(),
            byte_codec: None,
        }
    }

    pub fn message_id_on(field_name: impl Into<String>) -> Self {
        Self::MessageIdField {
            field_name: field_name.into(),
            byte_codec: None,
        }
    }

    /// Set the byte codec used for binary descriptor fields.
    pub fn with_byte_codec(mut self, codec: ByteCodec) -> Self {
        match &mut self {
            Self::ConfiguredField { byte_codec, .. }
            | Self::MetadataField { byte_codec, .. }
            | Self::GeneratedIdField { byte_codec, .. }
            | Self::JsonPathField { byte_codec, .. }
            | Self::MessageIdField { byte_codec, .. } => *byte_codec = Some(codec),
        }
        self
    }

    /// Convert absent values to an empty string instead of failing. Only
    /// meaningful for the configured and extracted-expression sources.
    pub fn with_convert_null(mut self, enabled: bool) -> Self {
        if let Self::ConfiguredField { convert_null, .. }
        | Self::JsonPathField { convert_null, .. } = &mut self
        {
            *convert_null = enabled;
        }
        self
    }

    /// The descriptor field this mapper is bound to.
    pub fn field(&self) -> Result<NativeField, WmqError> {
        NativeField::from_str(self.field_name())
    }

    pub fn field_name(&self) -> &str {
        match self {
            Self::ConfiguredField { field_name, .. }
            | Self::MetadataField { field_name, .. }
            | Self::GeneratedIdField { field_name, .. }
            | Self::JsonPathField { field_name, .. }
            | Self::MessageIdField { field_name, .. } => field_name,
        }
    }

    fn byte_codec(&self) -> Option<&ByteCodec> {
        match self {
            Self::ConfiguredField { byte_codec, .. }
            | Self::MetadataField { byte_codec, .. }
            | Self::GeneratedIdField { byte_codec, .. }
            | Self::JsonPathField { byte_codec, .. }
            | Self::MessageIdField { byte_codec, .. } => byte_codec.as_ref(),
        }
    }

    fn mapper_name(&self) -> &'static str {
        match self {
            Self::ConfiguredField { .. } => "configured-field",
            Self::MetadataField { .. } => "metadata-field",
            Self::GeneratedIdField { .. } => "generated-id-field",
            Self::JsonPathField { .. } => "json-path-field",
            Self::MessageIdField { .. } => "message-id-field",
        }
    }

    /// Copy information from the generic message into the native message.
    pub fn to_native(
        &self,
        msg: &GenericMessage,
        native: &mut NativeMessage,
    ) -> Result<(), WmqError> {
        let field = self.field()?;
        match self {
            Self::ConfiguredField {
                value,
                convert_null,
                ..
            } => {
                let value = match value {
                    Some(v) => v.clone(),
                    None if *convert_null => {
                        trace!(field = %field, "converting null configured value to \"\"");
                        String::new()
                    }
                    None => {
                        return Err(WmqError::FieldFormat {
                            field: field.name().to_string(),
                            message: "no configured value".to_string(),
                        })
                    }
                };
                trace!(%value, field = %field, "setting configured value");
                field.set(native, &value, self.byte_codec())
            }
            Self::MetadataField { metadata_key, .. } => {
                match msg.metadata_value(metadata_key) {
                    Some(value) => {
                        trace!(%value, field = %field, "setting metadata value");
                        field.set(native, value, self.byte_codec())
                    }
                    None => {
                        debug!(key = %metadata_key, "message does not contain metadata key, ignoring");
                        Ok(())
                    }
                }
            }
            Self::GeneratedIdField { .. } => {
                let value = uuid::Uuid::new_v4().to_string();
                trace!(%value, field = %field, "setting generated identifier");
                field.set(native, &value, self.byte_codec())
            }
            Self::JsonPathField {
                path, convert_null, ..
            } => {
                let value = match extract_json_path(msg, path)? {
                    Some(v) => v,
                    None if *convert_null => {
                        trace!(%path, "converting null extracted value to \"\"");
                        String::new()
                    }
                    None => {
                        return Err(WmqError::Extraction {
                            expression: path.clone(),
                            message: "no match in payload".to_string(),
                        })
                    }
                };
                trace!(%value, field = %field, "setting extracted value");
                field.set(native, &value, self.byte_codec())
            }
            Self::MessageIdField { .. } => {
                field.set(native, msg.unique_id(), self.byte_codec())
            }
        }
    }

    /// Copy information from the native message into the generic message.
    ///
    /// Write-only sources fail with [`WmqError::UnsupportedMapping`], never
    /// silently no-op.
    pub fn from_native(
        &self,
        native: &NativeMessage,
        msg: &mut GenericMessage,
    ) -> Result<(), WmqError> {
        let field = self.field()?;
        match self {
            Self::MetadataField { metadata_key, .. } => {
                let value = field.get(native, self.byte_codec())?;
                msg.add_metadata(metadata_key.clone(), value);
                Ok(())
            }
            Self::MessageIdField { .. } => {
                let value = field.get(native, self.byte_codec())?;
                msg.set_unique_id(value);
                Ok(())
            }
            Self::ConfiguredField { .. }
            | Self::GeneratedIdField { .. }
            | Self::JsonPathField { .. } => Err(WmqError::UnsupportedMapping {
                mapper: self.mapper_name().to_string(),
                direction: MappingDirection::FromNative,
            }),
        }
    }
}

/// Evaluate a dot-separated path against the message's JSON payload.
///
/// Segments are object keys, array indexes, or the `*` wildcard. When the
/// path matches more than one value, whichever match the traversal reaches
/// first is used; callers must not rely on a particular one being chosen.
fn extract_json_path(msg: &GenericMessage, path: &str) -> Result<Option<String>, WmqError> {
    let root: Value =
        serde_json::from_slice(msg.payload()).map_err(|e| WmqError::Extraction {
            expression: path.to_string(),
            message: format!("payload is not valid JSON: {e}"),
        })?;
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(WmqError::Extraction {
            expression: path.to_string(),
            message: "empty path expression".to_string(),
        });
    }
    Ok(select(&root, &segments).map(value_to_string))
}

fn select<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return match value {
            Value::Null => None,
            _ => Some(value),
        };
    };
    match (value, *segment) {
        (Value::Object(map), "*") => map.values().find_map(|v| select(v, rest)),
        (Value::Array(items), "*") => items.iter().find_map(|v| select(v, rest)),
        (Value::Object(map), key) => map.get(key).and_then(|v| select(v, rest)),
        (Value::Array(items), index) => index
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .and_then(|v| select(v, rest)),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
