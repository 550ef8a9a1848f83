use crate::{endpoint::Endpoint, event::LogLevel};
use serde::Deserialize;
use std::{error::Error as StdError, time::Duration};

pub(crate) const DEFAULT_PORT: u16 = 12201;
pub(crate) const DEFAULT_HTTP_PATH: &str = "/gelf";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_SHORT_MESSAGE_MAX_LENGTH: usize = 500;
const DEFAULT_MESSAGE_TEMPLATE_FIELD_NAME: &str = "message_template";
const DEFAULT_MAX_MESSAGE_SIZE_IN_UDP: usize = 8192;
const ENDPOINT_ENV_VAR: &str = "GELF_ENDPOINT";

/// Network protocol used to deliver GELF messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// Datagrams, chunked when larger than
    /// [`max_message_size_in_udp`](GelfSinkOptions::max_message_size_in_udp).
    #[default]
    Udp,
    /// Persistent stream connection, one null-terminated message per frame.
    Tcp,
    /// One `POST` request per message.
    Http,
}

/// Payload compression for UDP and HTTP. TCP messages are never compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Send the JSON document as is.
    #[default]
    None,
    /// Gzip the JSON document.
    Gzip,
}

/// Options controlling how a log event is turned into a GELF document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EncodingOptions {
    /// Maximum number of characters in `short_message`. Longer messages are truncated and
    /// additionally sent in full as `full_message`.
    ///
    /// Default: 500
    pub short_message_max_length: usize,

    /// Value of the `_facility` field.
    ///
    /// Default: unset, sent as `null`
    pub facility: Option<String>,

    /// Value of the `host` field. When unset the local host name is used.
    pub hostname_override: Option<String>,

    /// Add the raw message template as `_<message_template_field_name>`.
    ///
    /// Default: false
    pub include_message_template: bool,

    /// Field name used when [`include_message_template`](Self::include_message_template) is set.
    ///
    /// Default: `message_template`
    pub message_template_field_name: String,

    /// Skip properties that are substituted into the message template.
    ///
    /// Default: false
    pub exclude_message_template_properties: bool,

    /// Additionally explode sequences and dictionaries into indexed/keyed sub-fields.
    ///
    /// Default: false
    pub explode_array_values: bool,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            short_message_max_length: DEFAULT_SHORT_MESSAGE_MAX_LENGTH,
            facility: None,
            hostname_override: None,
            include_message_template: false,
            message_template_field_name: DEFAULT_MESSAGE_TEMPLATE_FIELD_NAME.into(),
            exclude_message_template_properties: false,
            explode_array_values: false,
        }
    }
}

/// Options of a GELF sink: where to send messages and how to encode them.
///
/// ```
/// use gelf_sink::{GelfSinkOptions, TransportType};
///
/// let options = GelfSinkOptions::default()
///     .with_host("graylog.internal")
///     .with_transport_type(TransportType::Tcp)
///     .with_facility("billing");
/// assert_eq!(12201, options.port);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GelfSinkOptions {
    /// Host name or IP address of the GELF input.
    ///
    /// Default: `localhost`
    pub hostname_or_address: String,

    /// Port of the GELF input.
    ///
    /// Default: 12201
    pub port: u16,

    /// Default: UDP
    pub transport_type: TransportType,

    /// Request path of the GELF HTTP input.
    ///
    /// Default: `/gelf`
    pub http_path: String,

    /// Use `https` for the HTTP transport.
    ///
    /// Default: false
    pub use_tls: bool,

    /// Events with a lower level are dropped.
    ///
    /// Default: Verbose
    pub minimum_level: LogLevel,

    /// Largest UDP datagram. Larger messages are chunked, which needs more than the 12 byte
    /// chunk header.
    ///
    /// Default: 8192
    pub max_message_size_in_udp: usize,

    /// Default: none
    pub compression: Compression,

    /// Serialize the JSON document with indentation.
    ///
    /// Default: false
    pub json_pretty_print: bool,

    /// Encoding options.
    #[serde(flatten)]
    pub encoding: EncodingOptions,
}

impl Default for GelfSinkOptions {
    fn default() -> Self {
        Self {
            hostname_or_address: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            transport_type: TransportType::default(),
            http_path: DEFAULT_HTTP_PATH.into(),
            use_tls: false,
            minimum_level: LogLevel::Verbose,
            max_message_size_in_udp: DEFAULT_MAX_MESSAGE_SIZE_IN_UDP,
            compression: Compression::default(),
            json_pretty_print: false,
            encoding: EncodingOptions::default(),
        }
    }
}

impl GelfSinkOptions {
    /// Create options pointing at the given endpoint, e.g. `udp://graylog:12201`.
    ///
    /// See [`Endpoint`] for the accepted format.
    pub fn from_endpoint(
        endpoint: impl AsRef<str>,
    ) -> Result<Self, Box<dyn StdError + Send + Sync + 'static>> {
        let endpoint: Endpoint = endpoint.as_ref().parse()?;
        Ok(Self::default().with_endpoint(endpoint))
    }

    /// Create options from the `GELF_ENDPOINT` environment variable.
    pub fn from_env() -> Result<Self, Box<dyn StdError + Send + Sync + 'static>> {
        let endpoint = std::env::var(ENDPOINT_ENV_VAR)?;
        Self::from_endpoint(endpoint)
    }

    /// Replace transport type, host, port, path and TLS setting with the given endpoint.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.transport_type = endpoint.transport_type;
        self.hostname_or_address = endpoint.host;
        self.port = endpoint.port;
        self.use_tls = endpoint.use_tls;
        if let Some(path) = endpoint.path {
            self.http_path = path;
        }
        self
    }

    /// Set the host name or address of the GELF input.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.hostname_or_address = host.into();
        self
    }

    /// Set the port of the GELF input.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the transport type.
    pub fn with_transport_type(mut self, transport_type: TransportType) -> Self {
        self.transport_type = transport_type;
        self
    }

    /// Set the minimum level of events that are sent.
    pub fn with_minimum_level(mut self, level: LogLevel) -> Self {
        self.minimum_level = level;
        self
    }

    /// Set the facility sent with every message.
    pub fn with_facility(mut self, facility: impl Into<String>) -> Self {
        self.encoding.facility = Some(facility.into());
        self
    }

    /// Set the `host` field instead of using the local host name.
    pub fn with_hostname_override(mut self, hostname: impl Into<String>) -> Self {
        self.encoding.hostname_override = Some(hostname.into());
        self
    }

    /// Set the maximum length of `short_message`.
    pub fn with_short_message_max_length(mut self, max_length: usize) -> Self {
        self.encoding.short_message_max_length = max_length;
        self
    }

    /// Set payload compression.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Replace all encoding options.
    pub fn with_encoding(mut self, encoding: EncodingOptions) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Options of the [`PeriodicBatcher`](crate::PeriodicBatcher).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchingOptions {
    /// Flush as soon as this many events are queued.
    ///
    /// Default: 10
    pub batch_size_limit: usize,

    /// Flush at least this often. Periods shorter than one millisecond are raised to one
    /// millisecond.
    ///
    /// Default: 2 seconds
    #[serde(with = "duration_millis")]
    pub period: Duration,

    /// Events emitted while this many are waiting are dropped.
    ///
    /// Default: 100000
    pub queue_limit: usize,
}

impl Default for BatchingOptions {
    fn default() -> Self {
        Self {
            batch_size_limit: 10,
            period: Duration::from_secs(2),
            queue_limit: 100_000,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
