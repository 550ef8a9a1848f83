//! A [GELF] sink for structured log events, shipping to [Graylog] or any other GELF input over
//! UDP, TCP or HTTP.
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [Graylog]: https://graylog.org
//!
//! # Usage
//!
//! Send events one by one:
//!
//! ```no_run
//! use gelf_sink::{GelfSink, GelfSinkOptions, LogEvent, LogLevel};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let options = GelfSinkOptions::from_endpoint("udp://graylog:12201")?.with_facility("billing");
//! let sink = GelfSink::new(options);
//! sink.emit(
//!     LogEvent::new(LogLevel::Warning, "Order {OrderId} is late")
//!         .with_property("OrderId", "A-17"),
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Or in batches, either through a [`PeriodicBatcher`] or as an OpenTelemetry log exporter
//! (requires the `logs` feature):
//!
//! ```no_run
//! use gelf_sink::{BatchGelfSink, GelfSinkOptions};
//! use opentelemetry_sdk::logs::SdkLoggerProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let sink = BatchGelfSink::new(GelfSinkOptions::from_endpoint("tcp://graylog:12201")?);
//! let provider = SdkLoggerProvider::builder()
//!     .with_batch_exporter(sink)
//!     .build();
//! # Ok(())
//! # }
//! ```
//!
//! Delivery is best effort. Errors never reach the code that emitted an event; they are reported
//! through [`diagnostics`].
//!
//! # Field mapping
//!
//! | Log event                       | GELF field                                   |
//! | ------------------------------- | -------------------------------------------- |
//! | rendered message                | `short_message`, `full_message` if truncated |
//! | timestamp                       | `timestamp` (seconds since epoch)            |
//! | level                           | `level` (syslog) and `_stringLevel`          |
//! | property `Name`                 | `_Name`                                      |
//! | property `id` (any case)        | `_id_`                                       |
//! | structure `User { Id: 1 }`      | `_User.Id`                                   |
//! | sequence `Tags: [a, b]`         | `_Tags`, plus `_Tags.0`, `_Tags.1` if exploded |
//! | error                           | `_ExceptionType`, `_ExceptionMessage`, `_StackTrace` |
//!
//! Text values that parse as integers or finite floats are sent as JSON numbers.
//!
//! | Level         | Syslog level      |
//! | ------------- | ----------------- |
//! | `Verbose`     | 7 (debug)         |
//! | `Debug`       | 7 (debug)         |
//! | `Information` | 6 (informational) |
//! | `Warning`     | 4 (warning)       |
//! | `Error`       | 3 (error)         |
//! | `Fatal`       | 2 (critical)      |
#![doc(html_root_url = "https://docs.rs/gelf-sink/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, unreachable_pub, missing_debug_implementations)]

mod batch;
mod batching;
mod components;
mod convert;
pub mod diagnostics;
mod endpoint;
mod error;
mod event;
#[cfg(feature = "logs")]
mod logs;
mod message_builder;
mod models;
mod options;
mod sink;
mod template;
mod transport;
mod value;

pub use batch::{BatchGelfSink, BatchOutcome, BatchedLogEventSink};
pub use batching::PeriodicBatcher;
pub use endpoint::{Endpoint, EndpointParseError};
pub use error::Error;
pub use event::{ErrorInfo, LogEvent, LogLevel};
pub use models::{GelfMessage, SyslogLevel};
pub use options::{BatchingOptions, Compression, EncodingOptions, GelfSinkOptions, TransportType};
pub use sink::{GelfSink, LogEventSink};
pub use template::MessageTemplate;
pub use transport::{HttpTransport, TcpTransport, Transport, UdpTransport};
pub use value::{LogEventProperty, PropertyValue, ScalarValue};
