use crate::models::SyslogLevel;
use serde::Serialize;
use serde_json::{Map, Value};

pub(crate) const GELF_VERSION: &str = "1.1";

/// A GELF 1.1 message.
///
/// Additional fields are kept in one map and serialized after the reserved fields. Their names
/// start with an underscore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GelfMessage {
    /// GELF version, always `1.1`.
    pub version: &'static str,

    /// Name of the host that sent the message.
    pub host: String,

    /// Message, truncated to the configured maximum length.
    pub short_message: String,

    /// Untruncated message. Only set when `short_message` was truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_message: Option<String>,

    /// Seconds since the Unix epoch, with fractional part.
    pub timestamp: f64,

    /// Syslog severity.
    pub level: SyslogLevel,

    /// Additional fields, including `_stringLevel` and `_facility`.
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl GelfMessage {
    /// Value of an additional field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.additional_fields.get(name)
    }
}
