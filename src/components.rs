use crate::{
    diagnostics,
    event::{LogEvent, LogLevel},
    message_builder::GelfConverter,
    models::GelfMessage,
    options::GelfSinkOptions,
    transport::{make_transport, Transport},
    Error,
};
use bytes::Bytes;
use futures_util::FutureExt;
use std::{any::Any, future::Future, panic::AssertUnwindSafe, sync::Arc};
use tokio_util::sync::CancellationToken;

/// State shared by the single-event and the batch sink: the converter and the transport, both
/// created on first use.
#[derive(Debug)]
pub(crate) struct SinkComponents {
    options: GelfSinkOptions,
    converter: once_cell::sync::OnceCell<GelfConverter>,
    transport: tokio::sync::OnceCell<Arc<dyn Transport>>,
    closed: CancellationToken,
}

impl SinkComponents {
    pub(crate) fn new(options: GelfSinkOptions) -> Self {
        Self {
            options,
            converter: once_cell::sync::OnceCell::new(),
            transport: tokio::sync::OnceCell::new(),
            closed: CancellationToken::new(),
        }
    }

    pub(crate) fn with_transport(options: GelfSinkOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport: tokio::sync::OnceCell::new_with(Some(transport)),
            ..Self::new(options)
        }
    }

    pub(crate) fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.options.minimum_level
    }

    fn converter(&self) -> &GelfConverter {
        self.converter
            .get_or_init(|| GelfConverter::from_options(&self.options.encoding))
    }

    pub(crate) async fn transport(&self) -> Result<&Arc<dyn Transport>, Error> {
        if self.closed.is_cancelled() {
            return Err(Error::Closed);
        }
        let transport = self
            .transport
            .get_or_try_init(|| make_transport(&self.options))
            .await?;
        if self.closed.is_cancelled() {
            // Closed while the transport was being created.
            transport.close();
            return Err(Error::Closed);
        }
        Ok(transport)
    }

    pub(crate) fn gelf_message(&self, event: &LogEvent) -> GelfMessage {
        self.converter().gelf_message(event)
    }

    /// Serialize the GELF message for an event.
    pub(crate) fn encode(&self, event: &LogEvent) -> Result<Bytes, Error> {
        let message = self.gelf_message(event);
        let json = if self.options.json_pretty_print {
            serde_json::to_vec_pretty(&message)
        } else {
            serde_json::to_vec(&message)
        };
        json.map(Bytes::from).map_err(Error::Serialize)
    }

    pub(crate) async fn send_event(&self, event: &LogEvent) -> Result<(), Error> {
        let payload = self.encode(event)?;
        self.transport().await?.send(payload).await
    }

    pub(crate) fn close(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();
        if let Some(transport) = self.transport.get() {
            transport.close();
        }
    }
}

/// Run a delivery future, turning a panic into [`Error::Panicked`].
pub(crate) async fn catch_panic<F>(future: F) -> Result<(), Error>
where
    F: Future<Output = Result<(), Error>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(Error::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".into()
    }
}

/// Report the outcome of a delivery on the diagnostics side-channel.
pub(crate) fn report(result: &Result<(), Error>) {
    if let Err(err) = result {
        diagnostics::handle_error(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recording(Mutex<Vec<Bytes>>);

    #[async_trait]
    impl Transport for Recording {
        async fn send(&self, payload: Bytes) -> Result<(), Error> {
            self.0.lock().unwrap().push(payload);
            Ok(())
        }

        fn close(&self) {}
    }

    #[test]
    fn minimum_level() {
        let components = SinkComponents::new(
            GelfSinkOptions::default().with_minimum_level(LogLevel::Warning),
        );
        assert!(!components.is_enabled(LogLevel::Information));
        assert!(components.is_enabled(LogLevel::Warning));
        assert!(components.is_enabled(LogLevel::Fatal));
    }

    #[tokio::test]
    async fn pretty_print() {
        let options = GelfSinkOptions {
            json_pretty_print: true,
            ..GelfSinkOptions::default().with_hostname_override("h")
        };
        let components = SinkComponents::new(options);
        let payload = components
            .encode(&LogEvent::new(LogLevel::Information, "x"))
            .unwrap();
        assert!(std::str::from_utf8(&payload).unwrap().contains("\n  \"host\": \"h\""));
    }

    #[tokio::test]
    async fn closed_components_reject_sends() {
        let recording = Arc::new(Recording::default());
        let components = SinkComponents::with_transport(GelfSinkOptions::default(), recording.clone());
        components.close();
        components.close();
        let result = components
            .send_event(&LogEvent::new(LogLevel::Information, "x"))
            .await;
        assert!(matches!(result, Err(Error::Closed)));
        assert!(recording.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn panics_become_errors() {
        let result = catch_panic(async {
            if true {
                panic!("boom");
            }
            Ok(())
        })
        .await;
        match result {
            Err(Error::Panicked(message)) => assert_eq!("boom", message),
            other => panic!("expected Panicked, got {:?}", other),
        }
    }
}
