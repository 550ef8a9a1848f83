use crate::options::TransportType;
use std::{error::Error as StdError, fmt::Debug};

/// Errors that occurred while encoding or delivering a log event.
///
/// None of these are ever returned to the code that emitted the log event. They are routed to
/// the [diagnostics](crate::diagnostics) side-channel and the event is dropped.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The GELF document failed to serialize to JSON.
    ///
    /// Note: This is an error in this crate. If you spot this, please open an issue.
    #[error("serializing GELF message failed with {0}")]
    Serialize(serde_json::Error),

    /// The serialized GELF document failed to compress.
    #[error("compressing GELF message failed with {0}")]
    Compress(std::io::Error),

    /// The configured host name could not be resolved to any address.
    #[error("resolving {host} failed with {source}")]
    Resolve {
        /// Host name or address that was looked up.
        host: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configured host name resolved to an empty address list.
    #[error("no address found for {0}")]
    AddressNotFound(String),

    /// Opening a socket or connection to the GELF input failed.
    #[error("connecting to GELF input failed with {0}")]
    Connect(std::io::Error),

    /// Writing to the socket or connection failed.
    #[error("writing GELF message failed with {0}")]
    Write(std::io::Error),

    /// The message is too large to be sent in the maximum number of UDP chunks.
    #[error("message needs {chunks} chunks, but GELF allows at most {max}")]
    TooManyChunks {
        /// Number of chunks the message would need.
        chunks: usize,
        /// Maximum number of chunks allowed per message.
        max: usize,
    },

    /// The maximum UDP datagram size leaves no room for chunk data after the chunk header.
    #[error("maximum UDP datagram size {max} is too small for chunking, needs more than {header} bytes")]
    DatagramSizeTooSmall {
        /// Configured maximum datagram size.
        max: usize,
        /// Size of the chunk header.
        header: usize,
    },

    /// Could not build or complete the HTTP request to the GELF input.
    #[error("sending HTTP request failed with {0}")]
    HttpConnection(Box<dyn StdError + Send + Sync + 'static>),

    /// The GELF HTTP input answered with a non-success status code.
    #[error("GELF HTTP input responded with {status}: {body}")]
    HttpStatus {
        /// Response status code.
        status: http::StatusCode,
        /// Response body, lossily decoded.
        body: String,
    },

    /// The sink or transport has been closed.
    #[error("transport has been closed")]
    Closed,

    /// `emit` was called outside of a tokio runtime and no runtime handle was configured.
    #[error("no tokio runtime available to send log event")]
    NoRuntime,

    /// The transport kind cannot be built from options alone with the enabled crate features.
    #[error("transport {0:?} is not available; enable an HTTP client feature or pass a transport")]
    UnsupportedTransport(TransportType),

    /// The HTTP endpoint built from the options is not a valid URI.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(http::uri::InvalidUri),

    /// The periodic batcher queue is full; the event was dropped.
    #[error("batch queue is full, dropping log event")]
    QueueFull,

    /// Encoding or sending a log event panicked.
    ///
    /// Note: This is an error in this crate. If you spot this, please open an issue.
    #[error("sending log event panicked: {0}")]
    Panicked(String),
}
