//! Loopback tests for the UDP, TCP and HTTP transports

use bytes::Bytes;
use flate2::read::GzDecoder;
use gelf_sink::{
    BatchGelfSink, BatchedLogEventSink, Compression, Error, GelfSink, GelfSinkOptions,
    HttpTransport, LogEvent, LogLevel, TcpTransport, Transport, TransportType,
};
use std::{collections::HashMap, io::Read, time::Duration};
use tokio::{
    io::AsyncReadExt,
    net::{TcpListener, TcpStream, UdpSocket},
    time::{sleep, timeout},
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn options(transport_type: TransportType, port: u16) -> GelfSinkOptions {
    GelfSinkOptions::default()
        .with_host("127.0.0.1")
        .with_port(port)
        .with_transport_type(transport_type)
        .with_hostname_override("test-host")
}

async fn udp_server() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

async fn recv_datagram(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0; 65536];
    let len = timeout(TIMEOUT, socket.recv(&mut buf))
        .await
        .expect("datagram arrives in time")
        .unwrap();
    buf.truncate(len);
    buf
}

#[tokio::test]
async fn udp_single_datagram() {
    let (server, port) = udp_server().await;
    let sink = GelfSink::new(options(TransportType::Udp, port));
    sink.emit(LogEvent::new(LogLevel::Information, "over udp"));

    let datagram = recv_datagram(&server).await;
    let json: serde_json::Value = serde_json::from_slice(&datagram).unwrap();
    assert_eq!("over udp", json["short_message"]);
    assert_eq!("test-host", json["host"]);
    sink.close();
}

#[tokio::test]
async fn udp_chunked_message_reassembles() {
    let (server, port) = udp_server().await;
    let options = GelfSinkOptions {
        max_message_size_in_udp: 200,
        ..options(TransportType::Udp, port)
    };
    let sink = GelfSink::new(options);
    let payload = "x".repeat(2000);
    sink.emit(LogEvent::new(LogLevel::Information, "big").with_property("Payload", payload.as_str()));

    let first = recv_datagram(&server).await;
    assert_eq!([0x1e, 0x0f], first[..2]);
    let message_id = first[2..10].to_vec();
    let count = first[11] as usize;
    assert!(count > 1);

    let mut chunks = HashMap::new();
    chunks.insert(first[10], first[12..].to_vec());
    while chunks.len() < count {
        let datagram = recv_datagram(&server).await;
        assert!(datagram.len() <= 200);
        assert_eq!(message_id, datagram[2..10]);
        assert_eq!(count, datagram[11] as usize);
        chunks.insert(datagram[10], datagram[12..].to_vec());
    }

    let reassembled: Vec<u8> = (0..count as u8).flat_map(|i| chunks[&i].clone()).collect();
    let json: serde_json::Value = serde_json::from_slice(&reassembled).unwrap();
    assert_eq!(payload, json["_Payload"]);
}

#[tokio::test]
async fn udp_gzip() {
    let (server, port) = udp_server().await;
    let sink = GelfSink::new(options(TransportType::Udp, port).with_compression(Compression::Gzip));
    sink.emit(LogEvent::new(LogLevel::Warning, "compressed"));

    let datagram = recv_datagram(&server).await;
    let mut json = String::new();
    GzDecoder::new(datagram.as_slice())
        .read_to_string(&mut json)
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!("compressed", json["short_message"]);
}

#[tokio::test]
async fn tcp_frames_are_null_terminated() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let sink = BatchGelfSink::new(options(TransportType::Tcp, port));

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buf = [0; 4096];
        while received.iter().filter(|b| **b == 0).count() < 2 {
            let len = stream.read(&mut buf).await.unwrap();
            assert!(len > 0, "connection closed early");
            received.extend_from_slice(&buf[..len]);
        }
        received
    });

    let outcome = sink
        .emit_batch(vec![
            LogEvent::new(LogLevel::Information, "first"),
            LogEvent::new(LogLevel::Information, "second"),
        ])
        .await;
    assert_eq!(2, outcome.sent);

    let received = timeout(TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(Some(&0), received.last());
    let mut messages: Vec<String> = received
        .split(|b| *b == 0)
        .filter(|frame| !frame.is_empty())
        .map(|frame| {
            let json: serde_json::Value = serde_json::from_slice(frame).unwrap();
            json["short_message"].as_str().unwrap().to_string()
        })
        .collect();
    messages.sort();
    assert_eq!(vec!["first", "second"], messages);
    sink.close();
}

#[tokio::test]
async fn tcp_connection_refused_fails_batch() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let sink = BatchGelfSink::new(options(TransportType::Tcp, port));
    let outcome = sink
        .emit_batch(vec![LogEvent::new(LogLevel::Information, "lost")])
        .await;
    assert_eq!(1, outcome.failed);
    assert!(matches!(outcome.errors[..], [Error::Connect(_)]));
}

async fn read_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut frame = Vec::new();
    let mut byte = [0; 1];
    loop {
        let len = stream.read(&mut byte).await.unwrap();
        assert!(len > 0, "connection closed before end of frame");
        if byte[0] == 0 {
            return frame;
        }
        frame.push(byte[0]);
    }
}

#[tokio::test]
async fn tcp_reconnects_after_broken_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (mut first, _) = listener.accept().await.unwrap();
        let first_frame = read_frame(&mut first).await;
        drop(first);

        let (mut second, _) = listener.accept().await.unwrap();
        let second_frame = read_frame(&mut second).await;
        (first_frame, second_frame)
    });

    let transport = TcpTransport::new("127.0.0.1", port);
    transport.send(Bytes::from_static(b"first")).await.unwrap();

    // Writes into a connection the peer has closed can still succeed locally until the reset
    // arrives, so keep sending until the server sees the second connection.
    for _ in 0..250 {
        if server.is_finished() {
            break;
        }
        if let Err(err) = transport.send(Bytes::from_static(b"second")).await {
            assert!(server.is_finished(), "send failed while server was up: {:?}", err);
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    let (first_frame, second_frame) = timeout(TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(b"first", first_frame.as_slice());
    assert_eq!(b"second", second_frame.as_slice());

    // The server is gone now: the connection breaks and reconnecting is refused.
    let mut error = None;
    for _ in 0..250 {
        if let Err(err) = transport.send(Bytes::from_static(b"third")).await {
            error = Some(err);
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert!(
        matches!(error, Some(Error::Connect(_)) | Some(Error::Write(_))),
        "unexpected result {:?}",
        error
    );
}

mod http_input {
    use super::*;
    use ::http::{header::CONTENT_ENCODING, Request, Response, StatusCode};
    use async_trait::async_trait;
    use opentelemetry_http::{HttpClient, HttpError};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct StatusClient {
        status: StatusCode,
        requests: Arc<Mutex<Vec<Request<Bytes>>>>,
    }

    impl StatusClient {
        fn new(status: StatusCode) -> Self {
            Self {
                status,
                requests: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl HttpClient for StatusClient {
        async fn send_bytes(&self, req: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            self.requests.lock().unwrap().push(req);
            Ok(Response::builder()
                .status(self.status)
                .body(Bytes::from_static(b"no input"))?)
        }
    }

    fn endpoint() -> ::http::Uri {
        "http://graylog:12201/gelf".parse().unwrap()
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let client = StatusClient::new(StatusCode::NOT_FOUND);
        let sink = BatchGelfSink::with_transport(
            GelfSinkOptions::default(),
            HttpTransport::new(client.clone(), endpoint()),
        );
        let outcome = sink
            .emit_batch(vec![LogEvent::new(LogLevel::Information, "x")])
            .await;
        assert_eq!(1, outcome.failed);
        match &outcome.errors[..] {
            [Error::HttpStatus { status, body }] => {
                assert_eq!(StatusCode::NOT_FOUND, *status);
                assert_eq!("no input", body.as_str());
            }
            other => panic!("unexpected errors {:?}", other),
        }
        assert_eq!(1, client.requests.lock().unwrap().len());
    }

    #[tokio::test]
    async fn gzip_body() {
        let client = StatusClient::new(StatusCode::ACCEPTED);
        let transport =
            HttpTransport::new(client.clone(), endpoint()).with_compression(Compression::Gzip);
        let sink = BatchGelfSink::with_transport(GelfSinkOptions::default(), transport);
        let outcome = sink
            .emit_batch(vec![LogEvent::new(LogLevel::Information, "zipped")])
            .await;
        assert!(outcome.is_success());

        let requests = client.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!("gzip", request.headers()[CONTENT_ENCODING]);
        let mut json = String::new();
        GzDecoder::new(request.body().as_ref())
            .read_to_string(&mut json)
            .unwrap();
        assert!(json.contains("\"short_message\":\"zipped\""));
    }
}
