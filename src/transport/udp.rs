use super::{chunker, gzip, resolve, Transport};
use crate::{options::Compression, Error};
use async_trait::async_trait;
use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const DEFAULT_MAX_DATAGRAM_SIZE: usize = 8192;

/// Sends GELF messages as UDP datagrams, chunked when they exceed the datagram size.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    max_datagram_size: usize,
    compression: Compression,
    cancel: CancellationToken,
}

impl UdpTransport {
    /// Resolve `host` and open a socket connected to it.
    pub async fn connect(host: &str, port: u16) -> Result<Self, Error> {
        let addr = resolve(host, port).await?;
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await.map_err(Error::Connect)?;
        socket.connect(addr).await.map_err(Error::Connect)?;
        debug!(%addr, "opened GELF UDP socket");

        Ok(Self {
            socket,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            compression: Compression::None,
            cancel: CancellationToken::new(),
        })
    }

    /// Largest datagram to send, chunk header included. Defaults to 8192 bytes.
    pub fn with_max_datagram_size(mut self, max_datagram_size: usize) -> Self {
        self.max_datagram_size = max_datagram_size;
        self
    }

    /// Compress payloads before chunking.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, payload: Bytes) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Closed);
        }

        let payload = match self.compression {
            Compression::Gzip => gzip(&payload)?,
            Compression::None => payload,
        };
        let datagrams =
            chunker::to_datagrams(payload, self.max_datagram_size, rand::random::<[u8; 8]>())?;
        if datagrams.len() > 1 {
            debug!(chunks = datagrams.len(), "sending chunked GELF message");
        }

        for datagram in datagrams {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Closed),
                result = self.socket.send(&datagram) => {
                    result.map_err(Error::Write)?;
                }
            }
        }
        Ok(())
    }

    fn close(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unresolvable_host() {
        let result = UdpTransport::connect("host.invalid", 12201).await;
        assert!(matches!(
            result,
            Err(Error::Resolve { .. } | Error::AddressNotFound(_))
        ));
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let transport = UdpTransport::connect("127.0.0.1", 12201).await.unwrap();
        transport.close();
        transport.close();
        assert!(matches!(
            transport.send(Bytes::from_static(b"{}")).await,
            Err(Error::Closed)
        ));
    }
}
