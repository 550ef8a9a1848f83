//! Delivery of serialized GELF messages over UDP, TCP and HTTP.

mod chunker;
mod http;
mod tcp;
mod udp;

pub use self::http::HttpTransport;
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use crate::{
    options::{GelfSinkOptions, TransportType},
    Error,
};
use async_trait::async_trait;
use bytes::Bytes;
use flate2::{write::GzEncoder, Compression as GzCompression};
use std::{fmt::Debug, io::Write, net::SocketAddr, sync::Arc};

/// Sends one serialized GELF message per call.
///
/// Implementations own their socket or connection. [`close`](Transport::close) must be
/// idempotent and may be called while a send is in flight; sends that have not completed are
/// aborted on a best-effort basis and later sends fail with [`Error::Closed`].
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// Send one complete GELF JSON document.
    async fn send(&self, payload: Bytes) -> Result<(), Error>;

    /// Release the underlying socket or connection.
    fn close(&self);
}

/// Build the transport described by the options.
pub(crate) async fn make_transport(options: &GelfSinkOptions) -> Result<Arc<dyn Transport>, Error> {
    match options.transport_type {
        TransportType::Udp => {
            let transport = UdpTransport::connect(&options.hostname_or_address, options.port)
                .await?
                .with_max_datagram_size(options.max_message_size_in_udp)
                .with_compression(options.compression);
            Ok(Arc::new(transport))
        }
        TransportType::Tcp => Ok(Arc::new(TcpTransport::new(
            options.hostname_or_address.clone(),
            options.port,
        ))),
        TransportType::Http => make_http_transport(options),
    }
}

#[cfg(any(feature = "reqwest-client", feature = "reqwest-client-rustls"))]
fn make_http_transport(options: &GelfSinkOptions) -> Result<Arc<dyn Transport>, Error> {
    let transport = HttpTransport::new(reqwest::Client::new(), http_endpoint(options)?)
        .with_compression(options.compression);
    Ok(Arc::new(transport))
}

#[cfg(not(any(feature = "reqwest-client", feature = "reqwest-client-rustls")))]
fn make_http_transport(options: &GelfSinkOptions) -> Result<Arc<dyn Transport>, Error> {
    Err(Error::UnsupportedTransport(options.transport_type))
}

/// `http(s)://host:port/path` of the GELF HTTP input.
pub(crate) fn http_endpoint(options: &GelfSinkOptions) -> Result<::http::Uri, Error> {
    let scheme = if options.use_tls { "https" } else { "http" };
    let host = &options.hostname_or_address;
    let host = if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.clone()
    };
    let path = if options.http_path.starts_with('/') {
        options.http_path.clone()
    } else {
        format!("/{}", options.http_path)
    };
    format!("{}://{}:{}{}", scheme, host, options.port, path)
        .parse()
        .map_err(Error::InvalidEndpoint)
}

pub(crate) async fn resolve(host: &str, port: u16) -> Result<SocketAddr, Error> {
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| Error::Resolve {
            host: host.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| Error::AddressNotFound(host.to_string()))
}

pub(crate) fn gzip(payload: &[u8]) -> Result<Bytes, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), GzCompression::default());
    encoder.write_all(payload).map_err(Error::Compress)?;
    encoder.finish().map(Bytes::from).map_err(Error::Compress)
}
