use crate::options::{TransportType, DEFAULT_PORT};
use std::str::FromStr;

/// Location of a GELF input, parsed from a URI-like string.
///
/// | Endpoint                        | Transport | Port  | Path      |
/// | ------------------------------- | --------- | ----- | --------- |
/// | `udp://graylog`                 | UDP       | 12201 |           |
/// | `tcp://graylog:12202`           | TCP       | 12202 |           |
/// | `http://graylog:12201/gelf`     | HTTP      | 12201 | `/gelf`   |
/// | `https://graylog/ingest`        | HTTP, TLS | 12201 | `/ingest` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Transport derived from the scheme.
    pub transport_type: TransportType,
    /// Host name or address.
    pub host: String,
    /// Port, 12201 if not given.
    pub port: u16,
    /// Request path. Only set for HTTP endpoints with a non-root path.
    pub path: Option<String>,
    /// Whether the scheme is `https`.
    pub use_tls: bool,
}

/// Error parsing an [`Endpoint`].
#[derive(thiserror::Error, Debug)]
pub enum EndpointParseError {
    /// Not a valid URI.
    #[error("invalid format")]
    InvalidFormat,
    /// No scheme given.
    #[error("missing scheme; expected one of udp://, tcp://, http://, https://")]
    MissingScheme,
    /// Scheme is not one of `udp`, `tcp`, `http`, `https`.
    #[error("unsupported scheme {0}")]
    UnsupportedScheme(String),
    /// No host given.
    #[error("missing host")]
    MissingHost,
    /// The port is not a number between 0 and 65535.
    #[error("invalid port {0}")]
    InvalidPort(String),
    /// A path was given for a UDP or TCP endpoint.
    #[error("path is only supported for http endpoints")]
    UnexpectedPath,
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uri: http::Uri = s
            .trim()
            .parse()
            .map_err(|_| EndpointParseError::InvalidFormat)?;

        let scheme = uri
            .scheme_str()
            .ok_or(EndpointParseError::MissingScheme)?
            .to_ascii_lowercase();
        let (transport_type, use_tls) = match scheme.as_str() {
            "udp" => (TransportType::Udp, false),
            "tcp" => (TransportType::Tcp, false),
            "http" => (TransportType::Http, false),
            "https" => (TransportType::Http, true),
            _ => return Err(EndpointParseError::UnsupportedScheme(scheme)),
        };

        let host = uri
            .host()
            .filter(|host| !host.is_empty())
            .ok_or(EndpointParseError::MissingHost)?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        let port = match uri.port() {
            Some(port) => port
                .as_str()
                .parse()
                .map_err(|_| EndpointParseError::InvalidPort(port.as_str().to_string()))?,
            None => DEFAULT_PORT,
        };

        let path = Some(uri.path().trim_end_matches('/'))
            .filter(|path| !path.is_empty())
            .map(String::from);
        if path.is_some() && transport_type != TransportType::Http {
            return Err(EndpointParseError::UnexpectedPath);
        }

        Ok(Endpoint {
            transport_type,
            host,
            port,
            path,
            use_tls,
        })
    }
}
