use super::Transport;
use crate::Error;
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::{io::AsyncWriteExt, net::TcpStream, sync::Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sends GELF messages over one persistent TCP connection, each terminated by a null byte.
///
/// The connection is opened on first send. When a write fails the connection is reopened once
/// and the write retried.
#[derive(Debug)]
pub struct TcpTransport {
    host: String,
    port: u16,
    stream: Mutex<Option<TcpStream>>,
    cancel: CancellationToken,
}

impl TcpTransport {
    /// Transport for `host:port`. Does not connect yet.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            stream: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    async fn connect(&self) -> Result<TcpStream, Error> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(Error::Connect)?;
        debug!(host = %self.host, port = self.port, "connected to GELF TCP input");
        Ok(stream)
    }

    async fn write_frame(&self, frame: &[u8]) -> Result<(), Error> {
        let mut guard = self.stream.lock().await;
        if let Some(stream) = guard.as_mut() {
            match stream.write_all(frame).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    debug!(error = %err, "GELF TCP connection broken, reconnecting");
                    *guard = None;
                }
            }
        }

        let stream = guard.insert(self.connect().await?);
        if let Err(err) = stream.write_all(frame).await {
            *guard = None;
            return Err(Error::Write(err));
        }
        Ok(())
    }

    fn disconnect(&self) {
        if let Ok(mut guard) = self.stream.try_lock() {
            *guard = None;
        }
    }
}

fn frame(payload: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(payload.len() + 1);
    frame.put_slice(payload);
    frame.put_u8(0);
    frame.freeze()
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, payload: Bytes) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Closed);
        }

        let frame = frame(&payload);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                // A partially written frame must not be followed by more data.
                self.disconnect();
                Err(Error::Closed)
            }
            result = self.write_frame(&frame) => result,
        }
    }

    fn close(&self) {
        self.cancel.cancel();
        self.disconnect();
    }
}
