use super::{gzip, Transport};
use crate::{options::Compression, Error};
use async_trait::async_trait;
use bytes::Bytes;
use http::{
    header::{CONTENT_ENCODING, CONTENT_TYPE},
    Request, Response, Uri,
};
use opentelemetry_http::HttpClient;
use tokio_util::sync::CancellationToken;

/// Posts GELF messages to the HTTP input of a GELF server, one message per request.
///
/// Any [`HttpClient`] works. With the `reqwest-client` feature the sink creates a
/// `reqwest::Client` on its own.
#[derive(Debug)]
pub struct HttpTransport<C> {
    client: C,
    endpoint: Uri,
    compression: Compression,
    cancel: CancellationToken,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Transport that posts to `endpoint`, e.g. `http://graylog:12201/gelf`.
    pub fn new(client: C, endpoint: Uri) -> Self {
        Self {
            client,
            endpoint,
            compression: Compression::None,
            cancel: CancellationToken::new(),
        }
    }

    /// Compress request bodies and set `Content-Encoding` accordingly.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    fn request(&self, payload: Bytes) -> Result<Request<Bytes>, Error> {
        let mut builder = Request::post(self.endpoint.clone()).header(CONTENT_TYPE, "application/json");
        let body = match self.compression {
            Compression::Gzip => {
                builder = builder.header(CONTENT_ENCODING, "gzip");
                gzip(&payload)?
            }
            Compression::None => payload,
        };
        builder
            .body(body)
            .map_err(|err| Error::HttpConnection(err.into()))
    }
}

fn check_status(response: Response<Bytes>) -> Result<(), Error> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::HttpStatus {
            status,
            body: String::from_utf8_lossy(response.body()).into_owned(),
        })
    }
}

#[async_trait]
impl<C: HttpClient + 'static> Transport for HttpTransport<C> {
    async fn send(&self, payload: Bytes) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Closed);
        }

        let request = self.request(payload)?;
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Closed),
            response = self.client.send_bytes(request) => response.map_err(Error::HttpConnection)?,
        };
        check_status(response)
    }

    fn close(&self) {
        self.cancel.cancel();
    }
}
